//! Script execution error representation

use derive_more::Display;
use mv2_asm::{ResponseStatus, Status, Word};

/// Fault raised while receiving or executing a script.
///
/// `detail` is the offending command index for script faults; subsystem
/// faults (ADC timeout, link intake) carry a subsystem detail instead. The
/// pair maps one-to-one onto the status words of the response frame, so an
/// error travels to the host without loss.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(fmt = "{status}: {detail}")]
#[must_use]
pub struct ScriptError {
    /// Wire status describing the fault.
    pub status: Status,
    /// Offending command index or subsystem detail.
    pub detail: Word,
}

impl ScriptError {
    /// A script fault located at a command index.
    pub const fn at(status: Status, index: usize) -> Self {
        Self {
            status,
            detail: index as Word,
        }
    }

    /// A subsystem fault with no command location.
    pub const fn subsystem(status: Status) -> Self {
        Self { status, detail: 0 }
    }
}

impl From<ScriptError> for ResponseStatus {
    fn from(e: ScriptError) -> Self {
        ResponseStatus::new(e.status, e.detail)
    }
}

impl std::error::Error for ScriptError {}
