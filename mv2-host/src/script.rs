//! Measurement script model and its compiler.
//!
//! The XML backend parses the document into the plain tree below; the
//! compiler consumes only the tree. Anything able to produce `Section`
//! values (a DOM walk, a hand-built record in a test) feeds the same
//! compiler.

mod compile;
mod xml;

pub use compile::{compile, CompiledScript, PlanEntry};

/// Repetition policy of a script section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Attribute absent: run the section once.
    Once,
    /// `repeat="0"`: run until interrupted.
    Forever,
    /// `repeat="n"`: run n times.
    Count(u32),
}

impl Repeat {
    /// Decode the raw attribute value, where −1 stands for "absent".
    pub fn from_attr(raw: i64) -> Self {
        match raw {
            0 => Repeat::Forever,
            n if n > 0 => Repeat::Count(n as u32),
            _ => Repeat::Once,
        }
    }
}

/// One `<command>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Raw command type byte; validated against the catalog at compile
    /// time, not parse time.
    pub type_byte: u8,
    /// Value byte for the low half of the command word.
    pub value: u8,
    /// Output column the result lands in; negative drops the sample.
    pub output_index: i32,
    /// Column name; the literal `"unknown"` means unnamed.
    pub output_name: String,
}

/// One child of a script section, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A single command.
    Command(CommandSpec),
    /// A repetition block. Loops hold commands only; the XML backend
    /// rejects nesting before compilation starts.
    Loop {
        /// Iteration count carried by the `loop-begin` value byte.
        count: u8,
        /// Collapse each column to its per-loop average.
        average: bool,
        /// Body commands, in document order.
        body: Vec<CommandSpec>,
    },
}

/// One script section: `<initialization>` or `<measurement>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// How often the orchestrator runs this section.
    pub repeat: Repeat,
    /// Commands and loops, in document order.
    pub items: Vec<Item>,
}

/// A parsed script document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSet {
    /// Runs once, before any measurement.
    pub initialization: Section,
    /// Runs per the section's repeat policy.
    pub measurement: Section,
}
