use core::fmt;

/// Electrical domain of an opcode.
///
/// The sensor front end is wired either for SPI register traffic or for
/// analog digitization, never both; the interpreter refuses to dispatch an
/// opcode whose category disagrees with the configured mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// SPI register access; requires digital mode.
    Digital,
    /// Field and temperature digitization; requires analog mode.
    Analog,
    /// Mode switches, loop markers and link housekeeping; mode-agnostic.
    Miscellaneous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u8)]
/// Opcode representation for the instrument link.
///
/// The discriminant is the wire byte. The catalog is static and identical on
/// the host and the instrument; a command word packs the opcode byte in its
/// high half, see [`crate::Command`].
pub enum Opcode {
    /// Drive the sensor INIT line high or low.
    SetInitBit = 0x01,
    /// Block until the data-ready line asserts, bounded by the ADC
    /// conversion timeout.
    WaitDataReady = 0x02,
    /// Read register bank 0 over SPI.
    ReadRegister0 = 0x1c,
    /// Read register bank 1 over SPI.
    ReadRegister1 = 0x1d,
    /// Read register bank 2 over SPI.
    ReadRegister2 = 0x1e,
    /// Write register bank 0, returning the previously addressed value.
    WriteRegister0 = 0x2c,
    /// Write register bank 1, returning the previously addressed value.
    WriteRegister1 = 0x2d,
    /// Write register bank 2, returning the previously addressed value.
    WriteRegister2 = 0x2e,
    /// Digitize the Bx field component.
    DigitizeBx = 0x41,
    /// Digitize the By field component.
    DigitizeBy = 0x42,
    /// Digitize the Bz field component.
    DigitizeBz = 0x43,
    /// Digitize the die temperature.
    DigitizeTemp = 0x44,
    /// Latch the analog option bits (range, measurement axis, low power,
    /// inversion, EMR).
    SetOptions = 0x45,
    /// Switch the front end between digital (value 0) and analog (non-zero)
    /// mode.
    SetMode = 0xc1,
    /// Open a repetition block; the value byte is the iteration count.
    LoopBegin = 0xc2,
    /// Close the innermost repetition block.
    LoopEnd = 0xc3,
    /// Report the instrument firmware version word.
    GetFwVersion = 0xc4,
}

impl Opcode {
    /// Electrical domain this opcode executes in.
    pub const fn category(&self) -> Category {
        use Opcode::*;
        match self {
            SetInitBit | WaitDataReady | ReadRegister0 | ReadRegister1 | ReadRegister2
            | WriteRegister0 | WriteRegister1 | WriteRegister2 => Category::Digital,
            DigitizeBx | DigitizeBy | DigitizeBz | DigitizeTemp | SetOptions => Category::Analog,
            SetMode | LoopBegin | LoopEnd | GetFwVersion => Category::Miscellaneous,
        }
    }

    /// Whether the low byte of the command word is meaningful for this
    /// opcode.
    pub const fn carries_value(&self) -> bool {
        use Opcode::*;
        matches!(
            self,
            SetInitBit
                | WriteRegister0
                | WriteRegister1
                | WriteRegister2
                | SetOptions
                | SetMode
                | LoopBegin
        )
    }

    /// Whether executing this opcode emits one result word.
    pub const fn returns_value(&self) -> bool {
        use Opcode::*;
        matches!(
            self,
            ReadRegister0
                | ReadRegister1
                | ReadRegister2
                | WriteRegister0
                | WriteRegister1
                | WriteRegister2
                | DigitizeBx
                | DigitizeBy
                | DigitizeBz
                | DigitizeTemp
                | GetFwVersion
        )
    }

    /// Whether this opcode delimits a repetition block.
    pub const fn is_loop_marker(&self) -> bool {
        matches!(self, Opcode::LoopBegin | Opcode::LoopEnd)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl core::convert::TryFrom<u8> for Opcode {
    type Error = InvalidOpcode;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        use Opcode::*;
        match b {
            0x01 => Ok(SetInitBit),
            0x02 => Ok(WaitDataReady),
            0x1c => Ok(ReadRegister0),
            0x1d => Ok(ReadRegister1),
            0x1e => Ok(ReadRegister2),
            0x2c => Ok(WriteRegister0),
            0x2d => Ok(WriteRegister1),
            0x2e => Ok(WriteRegister2),
            0x41 => Ok(DigitizeBx),
            0x42 => Ok(DigitizeBy),
            0x43 => Ok(DigitizeBz),
            0x44 => Ok(DigitizeTemp),
            0x45 => Ok(SetOptions),
            0xc1 => Ok(SetMode),
            0xc2 => Ok(LoopBegin),
            0xc3 => Ok(LoopEnd),
            0xc4 => Ok(GetFwVersion),
            _ => Err(InvalidOpcode),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The byte can't be mapped to any catalog opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidOpcode;

impl fmt::Display for InvalidOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid opcode byte")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidOpcode {}
