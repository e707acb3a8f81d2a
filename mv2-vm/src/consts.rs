//! Instrument parameters

use mv2_asm::{Word, RESPONSE_OVERHEAD_WORDS};

/// Upper bound on the command words a single request may carry.
pub const SCRIPT_CAPACITY: usize = 64;

/// Response frame words available on the small (UNO-class) board.
pub const RESPONSE_CAPACITY_SMALL: usize = 500;

/// Response frame words available on the large (MEGA-class) board.
pub const RESPONSE_CAPACITY_LARGE: usize = 3565;

/// Result words the small board can emit in one run.
pub const RESULT_CAPACITY_SMALL: usize = RESPONSE_CAPACITY_SMALL - RESPONSE_OVERHEAD_WORDS;

/// Result words the large board can emit in one run.
pub const RESULT_CAPACITY_LARGE: usize = RESPONSE_CAPACITY_LARGE - RESPONSE_OVERHEAD_WORDS;

/// Upper bound on a single conversion, in milliseconds. The slowest
/// configuration (16-bit resolution) refreshes at 0.375 kHz.
pub const ADC_TIMEOUT_MS: u64 = 5;

/// Bias added to the referenced field reading so the digitized value stays
/// non-negative at 10-bit resolution.
pub const ANALOG_OFFSET: Word = 0x200;

/// Left shift aligning a 10-bit conversion to the 16-bit result word.
pub const ANALOG_SHIFT: u32 = 6;

/// Version word reported by `get-fw-version`.
pub const FW_VERSION: Word = 0x0105;
