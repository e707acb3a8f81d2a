//! MV2 instrument-side script interpreter.
//!
//! The instrument receives a framed command buffer over the serial link,
//! executes it against the sensor hardware abstraction, and answers with a
//! framed result buffer. The interpreter is a stack-free linear walk with a
//! single level of loop nesting; emission order is exactly buffer order with
//! loop iterations expanded in sequence, which is what the host plans
//! against when it de-interleaves the response.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod consts;
pub mod error;
pub mod hal;
pub mod interpreter;
pub mod service;
pub mod sim;

pub use error::ScriptError;
pub use hal::{Hal, HalError, Mode, Options};
pub use interpreter::Interpreter;
pub use service::{read_request, serve_once, write_response};
pub use sim::SimHal;

pub mod prelude {
    //! Required types for running scripts against a hardware backend.
    #[doc(no_inline)]
    pub use mv2_asm::{Command, Opcode, ResponseStatus, Status, Word};

    pub use crate::{
        consts::*, error::ScriptError, hal::Hal, hal::HalError, hal::Mode, hal::Options,
        interpreter::Interpreter, sim::SimHal,
    };
}
