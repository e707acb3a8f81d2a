//! Host-side driver for the MV2 magnetometer.
//!
//! Reads a declarative XML measurement script, compiles it into the command
//! words the instrument executes, ships it over the serial link, and folds
//! the tagged response stream back into named output columns. The compiler
//! produces plain data (`CompiledScript`); the orchestrator owns the link
//! and drives a stateless exchange routine, so nothing here holds a back
//! pointer to anything.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod channel;
pub mod columns;
pub mod error;
pub mod record;
pub mod runner;
pub mod script;

pub use channel::{Channel, SerialChannel};
pub use error::HostError;
pub use record::MxrFile;
pub use runner::{execute, Run, Runner};
pub use script::{
    compile, CommandSpec, CompiledScript, Item, PlanEntry, Repeat, ScriptSet, Section,
};
