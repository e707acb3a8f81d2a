//! Host-side error taxonomy.

use mv2_asm::{FrameError, Status, Word};

/// Everything that can end a run on the host.
///
/// There is no local recovery below the orchestrator; compiler, codec and
/// de-interleaver faults all propagate here by value and terminate the
/// current run.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The script names a command type outside the opcode catalog.
    #[error("command type does not exist: {0:#04x}")]
    BadCommandType(u8),

    /// The script file doesn't match the expected structure.
    #[error("invalid script: {0}")]
    BadScript(String),

    /// The script nests a loop inside a loop.
    #[error("nested loops are not supported")]
    NestedLoop,

    /// A response frame failed its integrity checks.
    #[error("{0}")]
    Frame(#[from] FrameError),

    /// The instrument reported a fault in its status pair.
    #[error("instrument error: {}: {detail}", .status.tag())]
    Instrument {
        /// Status word from the response.
        status: Status,
        /// Offending command index or subsystem detail.
        detail: Word,
    },

    /// The response status word is outside the taxonomy; the frame passed
    /// its CRC, so the link itself garbled the exchange.
    #[error("transmission error: unknown status code {0}")]
    UnknownStatus(Word),

    /// Serial port configuration or enumeration failure.
    #[error("serial port: {0}")]
    Serial(#[from] serialport::Error),

    /// Byte-level I/O failure, including read timeouts.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The interrupt flag asserted between measurement iterations.
    #[error("interrupt received")]
    Interrupted,

    /// The interrupt handler could not be installed.
    #[error("cannot install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
