//! Orchestrator: drive compiled scripts over a channel and collect runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mv2_asm::{
    frame_len_from_header, parse_response, words_from_le_bytes, wrap_request, Status, Word,
    WORD_BYTES,
};

use crate::channel::Channel;
use crate::columns;
use crate::error::HostError;
use crate::script::{compile, CompiledScript, Repeat, ScriptSet};

/// One completed measurement: columns plus their headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Output columns, indexed as the script addressed them.
    pub columns: Vec<Vec<Word>>,
    /// One heading per column.
    pub headings: Vec<String>,
}

impl Run {
    /// Results rendered as CSV rows.
    pub fn results_csv(&self) -> String {
        columns::results_csv(&self.columns)
    }

    /// Headings rendered as one CSV line.
    pub fn headings_csv(&self) -> String {
        columns::headings_csv(&self.headings)
    }
}

/// Execute one compiled script over the channel.
///
/// Stateless: frames the request, transmits it, reads the response in two
/// phases (header word, then the length it announces), verifies the CRC,
/// checks the status pair and de-interleaves the data region. Any instrument
/// fault surfaces with its taxonomy tag and detail word.
pub fn execute<C: Channel>(channel: &mut C, script: &CompiledScript) -> Result<Run, HostError> {
    channel.write_all(&wrap_request(&script.commands))?;

    let mut header = [0u8; WORD_BYTES];
    channel.read_exact(&mut header)?;
    let header_word = Word::from_le_bytes(header);
    let total_bytes = frame_len_from_header(header_word)?;

    let mut rest = vec![0u8; total_bytes - WORD_BYTES];
    channel.read_exact(&mut rest)?;

    let mut frame = vec![header_word];
    frame.extend(words_from_le_bytes(&rest)?);
    let (results, status_word, detail) = parse_response(&frame)?;

    let status =
        Status::try_from(status_word).map_err(|unknown| HostError::UnknownStatus(unknown.0))?;
    if !matches!(status, Status::NoError) {
        return Err(HostError::Instrument { status, detail });
    }

    tracing::debug!(results = results.len(), "response accepted");
    let cols = columns::deinterleave(&results, &script.plan)?;
    let headings = columns::headings(&script.plan, cols.len());
    Ok(Run {
        columns: cols,
        headings,
    })
}

/// Drives a script set to completion over an owned channel.
pub struct Runner<C> {
    channel: C,
    initialization: CompiledScript,
    measurement: CompiledScript,
    repeat: Repeat,
    interrupt: Arc<AtomicBool>,
}

impl<C: Channel> Runner<C> {
    /// Compile both sections and take ownership of the channel.
    pub fn new(channel: C, scripts: &ScriptSet) -> Result<Self, HostError> {
        Ok(Self {
            channel,
            initialization: compile(&scripts.initialization)?,
            measurement: compile(&scripts.measurement)?,
            repeat: scripts.measurement.repeat,
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an interrupt flag with a signal handler; the run loop polls it
    /// between iterations.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// Run initialization once, then the measurement section per its repeat
    /// policy, handing each completed run to the sink.
    ///
    /// Returns the number of measurement runs completed. An asserted
    /// interrupt flag stops the loop at the next iteration boundary and
    /// reports [`HostError::Interrupted`]; mid-exchange cancellation is not
    /// supported, the channel would be left in an undefined state.
    pub fn run<F>(&mut self, mut sink: F) -> Result<u32, HostError>
    where
        F: FnMut(&Run) -> Result<(), HostError>,
    {
        execute(&mut self.channel, &self.initialization)?;

        let mut completed = 0u32;
        loop {
            match self.repeat {
                Repeat::Once if completed >= 1 => break,
                Repeat::Count(n) if completed >= n => break,
                _ => {}
            }
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::info!(completed, "interrupt received");
                return Err(HostError::Interrupted);
            }

            let run = execute(&mut self.channel, &self.measurement)?;
            sink(&run)?;
            completed += 1;
        }
        Ok(completed)
    }
}
