//! Byte transport to the instrument.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::HostError;

/// Link baud rate; fixed by the firmware.
const BAUD_RATE: u32 = 57_600;

/// A full response can take this long when a script loops over slow
/// conversions.
const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Opening the port raises DTR, which resets the board; the bootloader
/// needs this long before it listens.
const REBOOT_WAIT: Duration = Duration::from_secs(2);

/// Blocking byte channel the orchestrator drives.
///
/// Writes precede reads within one exchange; both either complete fully or
/// fail the run.
pub trait Channel {
    /// Transmit the whole buffer or fail.
    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Block until the buffer is filled or the deadline expires.
    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()>;
}

/// The instrument's serial link: 8-N-1 at 57600 baud, no flow control.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Open and configure the port.
    ///
    /// Raising DTR resets the instrument, so this waits out the reboot and
    /// purges whatever the bootloader chattered into the buffers before the
    /// first exchange.
    pub fn open(port_name: &str) -> Result<Self, HostError> {
        let mut port = serialport::new(port_name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;

        port.write_data_terminal_ready(true)?;
        tracing::debug!(port = port_name, "waiting for instrument reboot");
        std::thread::sleep(REBOOT_WAIT);
        port.clear(ClearBuffer::All)?;

        Ok(Self { port })
    }
}

impl Channel for SerialChannel {
    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.port.read_exact(buf)
    }
}
