//! Section compiler: script tree to command buffer plus result plan.

use mv2_asm::{Command, Opcode};

use crate::error::HostError;
use crate::script::{CommandSpec, Item, Section};

/// Where one emission-eligible command routes its samples.
///
/// One entry per returns-value command, in command-stream order. Inside a
/// loop only the first entry of the span carries the loop metadata; the
/// rest of the span inherits through `in_loop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Target column; negative drops the sample.
    pub output_index: i32,
    /// Column name; the literal `"unknown"` means unnamed.
    pub output_name: String,
    /// This entry sits inside a loop body.
    pub in_loop: bool,
    /// Iteration count, carried by the first entry of a span only.
    pub loop_count: u8,
    /// Plan entries contributed by one body iteration, first entry only.
    pub loop_span: usize,
    /// Collapse the span's columns to per-loop averages, first entry only.
    pub averaged: bool,
}

impl PlanEntry {
    fn plain(spec: &CommandSpec) -> Self {
        Self {
            output_index: spec.output_index,
            output_name: spec.output_name.clone(),
            in_loop: false,
            loop_count: 0,
            loop_span: 0,
            averaged: false,
        }
    }
}

/// A wire-ready command buffer with the plan to route its response.
///
/// Built once per script section, consumed once per execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    /// Ordered command words, loops flattened to begin/end markers.
    pub commands: Vec<Command>,
    /// Routing metadata for every emission-eligible command.
    pub plan: Vec<PlanEntry>,
}

/// Compile one script section.
///
/// Unknown command type bytes fail with the offending byte; loop markers
/// written as plain commands are dropped (loops are expressed by structure,
/// not by opcode); commands that return nothing contribute no plan entry
/// regardless of their output index.
pub fn compile(section: &Section) -> Result<CompiledScript, HostError> {
    let mut script = CompiledScript {
        commands: Vec::new(),
        plan: Vec::new(),
    };

    for item in &section.items {
        match item {
            Item::Command(spec) => push_command(&mut script, spec)?,
            Item::Loop {
                count,
                average,
                body,
            } => {
                script.commands.push(Command::new(Opcode::LoopBegin, *count));
                let span_start = script.plan.len();
                for spec in body {
                    push_command(&mut script, spec)?;
                }
                let span = script.plan.len() - span_start;
                if span > 0 {
                    let head = &mut script.plan[span_start];
                    head.loop_count = *count;
                    head.loop_span = span;
                    head.averaged = *average;
                    for entry in &mut script.plan[span_start..] {
                        entry.in_loop = true;
                    }
                }
                script.commands.push(Command::new(Opcode::LoopEnd, 0));
            }
        }
    }

    tracing::debug!(
        commands = script.commands.len(),
        plan = script.plan.len(),
        "section compiled"
    );
    Ok(script)
}

fn push_command(script: &mut CompiledScript, spec: &CommandSpec) -> Result<(), HostError> {
    let op = Opcode::try_from(spec.type_byte)
        .map_err(|_| HostError::BadCommandType(spec.type_byte))?;
    if op.is_loop_marker() {
        return Ok(());
    }
    if op.returns_value() {
        script.plan.push(PlanEntry::plain(spec));
    }
    script.commands.push(Command::pack(spec.type_byte, spec.value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Repeat;
    use mv2_asm::Word;

    fn spec(type_byte: u8, value: u8, output_index: i32, name: &str) -> CommandSpec {
        CommandSpec {
            type_byte,
            value,
            output_index,
            output_name: name.to_string(),
        }
    }

    fn section(items: Vec<Item>) -> Section {
        Section {
            repeat: Repeat::Once,
            items,
        }
    }

    #[test]
    fn plain_commands_compile_in_document_order() {
        let compiled = compile(&section(vec![
            Item::Command(spec(0xc1, 1, -1, "unknown")),
            Item::Command(spec(0x41, 0, 0, "Bx")),
        ]))
        .unwrap();

        let words: Vec<Word> = compiled.commands.iter().map(|c| Word::from(*c)).collect();
        assert_eq!(vec![0xc101, 0x4100], words);
        // set-mode returns nothing: one plan entry
        assert_eq!(1, compiled.plan.len());
        assert_eq!(0, compiled.plan[0].output_index);
        assert!(!compiled.plan[0].in_loop);
    }

    #[test]
    fn loop_emits_markers_and_span_metadata() {
        let compiled = compile(&section(vec![Item::Loop {
            count: 4,
            average: true,
            body: vec![spec(0x41, 0, 0, "Bx"), spec(0x42, 0, 1, "By")],
        }]))
        .unwrap();

        let words: Vec<Word> = compiled.commands.iter().map(|c| Word::from(*c)).collect();
        assert_eq!(vec![0xc204, 0x4100, 0x4200, 0xc300], words);

        assert_eq!(2, compiled.plan.len());
        let head = &compiled.plan[0];
        assert!(head.in_loop && head.averaged);
        assert_eq!(4, head.loop_count);
        assert_eq!(2, head.loop_span);
        // the rest of the span inherits in_loop only
        let tail = &compiled.plan[1];
        assert!(tail.in_loop);
        assert_eq!(0, tail.loop_count);
    }

    #[test]
    fn empty_loop_body_emits_bare_markers() {
        let compiled = compile(&section(vec![Item::Loop {
            count: 8,
            average: false,
            body: vec![],
        }]))
        .unwrap();

        let words: Vec<Word> = compiled.commands.iter().map(|c| Word::from(*c)).collect();
        assert_eq!(vec![0xc208, 0xc300], words);
        assert!(compiled.plan.is_empty());
    }

    #[test]
    fn non_returning_commands_never_reach_the_plan() {
        let compiled = compile(&section(vec![
            Item::Command(spec(0x01, 1, 5, "init")),
            Item::Command(spec(0x02, 0, 6, "wait")),
        ]))
        .unwrap();
        assert_eq!(2, compiled.commands.len());
        assert!(compiled.plan.is_empty());
    }

    #[test]
    fn unknown_type_byte_fails_with_the_byte() {
        let err = compile(&section(vec![Item::Command(spec(0x99, 0, 0, "x"))])).unwrap_err();
        assert!(matches!(err, HostError::BadCommandType(0x99)));
    }

    #[test]
    fn loop_markers_as_commands_are_dropped() {
        let compiled = compile(&section(vec![
            Item::Command(spec(0xc2, 3, -1, "unknown")),
            Item::Command(spec(0x44, 0, 0, "T")),
            Item::Command(spec(0xc3, 0, -1, "unknown")),
        ]))
        .unwrap();
        let words: Vec<Word> = compiled.commands.iter().map(|c| Word::from(*c)).collect();
        assert_eq!(vec![0x4400], words);
    }

    #[test]
    fn consecutive_loops_keep_separate_spans() {
        let compiled = compile(&section(vec![
            Item::Loop {
                count: 2,
                average: false,
                body: vec![spec(0x41, 0, 0, "Bx")],
            },
            Item::Loop {
                count: 3,
                average: true,
                body: vec![spec(0x42, 0, 1, "By")],
            },
        ]))
        .unwrap();

        assert_eq!(2, compiled.plan.len());
        assert_eq!(2, compiled.plan[0].loop_count);
        assert!(!compiled.plan[0].averaged);
        assert_eq!(3, compiled.plan[1].loop_count);
        assert!(compiled.plan[1].averaged);
    }
}
