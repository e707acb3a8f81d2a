//! Atomic types of the MV2 instrument link.
//!
//! Everything the host and the instrument must agree on byte for byte lives
//! here: the opcode catalog, the packed command word, the status taxonomy
//! reported by the instrument, and the length-prefixed XOR-checksummed frame
//! layout used in both directions over the serial wire.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

extern crate alloc;

mod command;
mod frame;
mod opcode;
mod status;

pub use command::Command;
pub use frame::{
    checksum,
    frame_len_from_header,
    parse_response,
    words_from_le_bytes,
    words_to_le_bytes,
    wrap_request,
    wrap_response,
    FrameError,
    MIN_RESPONSE_WORDS,
    REQUEST_OVERHEAD_WORDS,
    RESPONSE_OVERHEAD_WORDS,
    WORD_BYTES,
};
pub use opcode::{Category, InvalidOpcode, Opcode};
pub use status::{ResponseStatus, Status, UnknownStatus};

/// Register size for the instrument link; all wire payloads are sequences of
/// these.
pub type Word = u16;
