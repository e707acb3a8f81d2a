//! Link service: request intake and response emission.
//!
//! One exchange is one framed request in, one framed response out. Intake
//! validates the frame before the interpreter sees it; every fault, intake
//! or execution, travels back in the status pair of an otherwise empty
//! response, and the response CRC covers error frames the same as data
//! frames.

use std::io::{Read, Write};

use mv2_asm::{
    checksum, words_from_le_bytes, words_to_le_bytes, wrap_response, Command, ResponseStatus,
    Status, Word, REQUEST_OVERHEAD_WORDS, WORD_BYTES,
};

use crate::consts::SCRIPT_CAPACITY;
use crate::error::ScriptError;
use crate::hal::Hal;
use crate::interpreter::Interpreter;

/// Read and validate one request frame, yielding its command buffer.
///
/// A malformed header is `no-valid-data`, a script beyond the command
/// buffer is `script-too-large`, a read failure mid-frame is
/// `transmission`, and a failed XOR check is `bad-crc`. An oversized frame
/// is drained before rejection so the link stays word-aligned for the next
/// exchange.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Vec<Command>, ScriptError> {
    let mut header = [0u8; WORD_BYTES];
    reader
        .read_exact(&mut header)
        .map_err(|_| ScriptError::subsystem(Status::Transmission))?;
    let header_word = Word::from_le_bytes(header);
    let size_bytes = header_word as usize;

    if size_bytes < REQUEST_OVERHEAD_WORDS * WORD_BYTES || size_bytes % WORD_BYTES != 0 {
        return Err(ScriptError::subsystem(Status::NoValidData));
    }

    let mut rest = vec![0u8; size_bytes - WORD_BYTES];
    reader
        .read_exact(&mut rest)
        .map_err(|_| ScriptError::subsystem(Status::Transmission))?;

    let command_count = size_bytes / WORD_BYTES - REQUEST_OVERHEAD_WORDS;
    if command_count > SCRIPT_CAPACITY {
        return Err(ScriptError::subsystem(Status::ScriptTooLarge));
    }

    let words = words_from_le_bytes(&rest)
        .map_err(|_| ScriptError::subsystem(Status::NoValidData))?;
    if header_word ^ checksum(&words) != 0 {
        return Err(ScriptError::subsystem(Status::BadCrc));
    }

    Ok(words[..command_count].iter().copied().map(Command::from).collect())
}

/// Frame a result region and status pair and write it to the link,
/// word by word, little-endian.
pub fn write_response<W: Write>(
    writer: &mut W,
    results: &[Word],
    status: ResponseStatus,
) -> std::io::Result<()> {
    let frame = wrap_response(results, status);
    writer.write_all(&words_to_le_bytes(&frame))?;
    writer.flush()
}

/// Service one request: intake, execute, respond.
///
/// The script runs to completion before anything is written back; partial
/// responses are never emitted.
pub fn serve_once<H, R, W>(
    interpreter: &mut Interpreter<H>,
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<()>
where
    H: Hal,
    R: Read,
    W: Write,
{
    let commands = match read_request(reader) {
        Ok(commands) => commands,
        Err(e) => {
            tracing::debug!(error = %e, "request rejected");
            return write_response(writer, &[], e.into());
        }
    };

    match interpreter.run(&commands) {
        Ok(results) => {
            tracing::debug!(emitted = results.len(), "script complete");
            write_response(writer, results, ResponseStatus::OK)
        }
        Err(e) => {
            tracing::debug!(error = %e, "script failed");
            write_response(writer, &[], e.into())
        }
    }
}
