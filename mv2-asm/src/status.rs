use core::fmt;

use crate::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u16)]
/// Status word reported in every response frame.
///
/// The 1xx range covers script execution faults, the 2xx range covers link
/// and intake faults, the 3xx range covers sensor subsystem faults. The
/// numeric values are wire-visible and fixed.
pub enum Status {
    /// The run completed and the data region is valid.
    NoError = 0,
    /// A command word decoded to a byte outside the opcode catalog.
    Syntax = 101,
    /// A digital opcode arrived in analog mode, or vice versa.
    Mode = 102,
    /// The response buffer filled before the script finished.
    OutOfMemory = 103,
    /// A second `loop-begin` appeared before the matching `loop-end`.
    NestedLoop = 104,
    /// A `loop-begin` had no matching `loop-end` in the buffer.
    UnspecifiedLoop = 105,
    /// The request frame failed its XOR check.
    BadCrc = 201,
    /// The request script exceeds the instrument's command buffer.
    ScriptTooLarge = 202,
    /// The request frame was malformed before the CRC could be checked.
    NoValidData = 203,
    /// The link dropped bytes mid-frame.
    Transmission = 204,
    /// A conversion never raised data-ready within the ADC timeout.
    AdcTimeout = 301,
}

impl Status {
    /// Textual tag used in error reporting.
    pub const fn tag(&self) -> &'static str {
        match self {
            Status::NoError => "no-error",
            Status::Syntax => "syntax",
            Status::Mode => "mode",
            Status::OutOfMemory => "out-of-memory",
            Status::NestedLoop => "nested-loop",
            Status::UnspecifiedLoop => "unspecified-loop",
            Status::BadCrc => "bad-crc",
            Status::ScriptTooLarge => "script-too-large",
            Status::NoValidData => "no-valid-data",
            Status::Transmission => "transmission",
            Status::AdcTimeout => "adc-timeout",
        }
    }
}

impl From<Status> for Word {
    fn from(status: Status) -> Word {
        status as Word
    }
}

impl core::convert::TryFrom<Word> for Status {
    type Error = UnknownStatus;

    fn try_from(w: Word) -> Result<Self, Self::Error> {
        use Status::*;
        match w {
            0 => Ok(NoError),
            101 => Ok(Syntax),
            102 => Ok(Mode),
            103 => Ok(OutOfMemory),
            104 => Ok(NestedLoop),
            105 => Ok(UnspecifiedLoop),
            201 => Ok(BadCrc),
            202 => Ok(ScriptTooLarge),
            203 => Ok(NoValidData),
            204 => Ok(Transmission),
            301 => Ok(AdcTimeout),
            _ => Err(UnknownStatus(w)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Status {}

/// The status word of a response doesn't belong to the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownStatus(
    /// The offending wire code.
    pub Word,
);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status code {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownStatus {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The status pair carried at the tail of every response frame.
///
/// `detail` is the offending command index for script faults and a
/// subsystem-specific value otherwise; zero on success.
pub struct ResponseStatus {
    status: Status,
    detail: Word,
}

impl ResponseStatus {
    /// A successful run.
    pub const OK: Self = Self::new(Status::NoError, 0);

    /// Pair a status with its detail word.
    pub const fn new(status: Status, detail: Word) -> Self {
        Self { status, detail }
    }

    /// The status word.
    pub const fn status(&self) -> Status {
        self.status
    }

    /// The detail word.
    pub const fn detail(&self) -> Word {
        self.detail
    }

    /// This pair reports a completed run?
    pub const fn is_success(&self) -> bool {
        matches!(self.status, Status::NoError)
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn status_word_round_trip() {
        for status in Status::iter() {
            let w = Word::from(status);
            assert_eq!(Ok(status), Status::try_from(w));
        }
        for w in [1, 100, 106, 200, 205, 300, 302, u16::MAX] {
            assert_eq!(Err(UnknownStatus(w)), Status::try_from(w));
        }
    }

    #[test]
    fn success_is_only_no_error() {
        assert!(ResponseStatus::OK.is_success());
        for status in Status::iter().filter(|s| !matches!(s, Status::NoError)) {
            assert!(!ResponseStatus::new(status, 7).is_success());
        }
    }
}
