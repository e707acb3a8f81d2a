//! Length-prefixed, XOR-checksummed word frames.
//!
//! Both directions use the same closure rule: the first word is the total
//! frame size in bytes (itself included), the last word is the XOR of every
//! preceding word, so the XOR over a whole valid frame is zero. Words travel
//! little-endian on the byte-oriented wire.

use alloc::vec::Vec;
use core::fmt;

use crate::{Command, ResponseStatus, Word};

/// Width of a wire word in bytes.
pub const WORD_BYTES: usize = core::mem::size_of::<Word>();

/// Words a request frame adds around the command buffer: header and CRC.
pub const REQUEST_OVERHEAD_WORDS: usize = 2;

/// Words a response frame adds around the data region: header, status pair
/// and CRC.
pub const RESPONSE_OVERHEAD_WORDS: usize = 4;

/// Smallest well-formed response: header, status pair, CRC, no data.
pub const MIN_RESPONSE_WORDS: usize = RESPONSE_OVERHEAD_WORDS;

/// XOR fold over a word sequence.
pub fn checksum(words: &[Word]) -> Word {
    words.iter().fold(0, |crc, w| crc ^ w)
}

/// Frame a command buffer for transmission and serialize it little-endian.
pub fn wrap_request(commands: &[Command]) -> Vec<u8> {
    let mut words = Vec::with_capacity(commands.len() + REQUEST_OVERHEAD_WORDS);
    words.push(((commands.len() + REQUEST_OVERHEAD_WORDS) * WORD_BYTES) as Word);
    words.extend(commands.iter().map(|c| Word::from(*c)));
    words.push(checksum(&words));
    words_to_le_bytes(&words)
}

/// Frame a result region and status pair into response words.
///
/// The instrument writes these to the wire; the CRC covers error-bearing
/// frames the same way it covers data.
pub fn wrap_response(results: &[Word], status: ResponseStatus) -> Vec<Word> {
    let mut words = Vec::with_capacity(results.len() + RESPONSE_OVERHEAD_WORDS);
    words.push(((results.len() + RESPONSE_OVERHEAD_WORDS) * WORD_BYTES) as Word);
    words.extend_from_slice(results);
    words.push(status.status().into());
    words.push(status.detail());
    words.push(checksum(&words));
    words
}

/// Total frame length in bytes, decoded from the header word of a response.
///
/// Rejects lengths below the four-word minimum and lengths that aren't a
/// multiple of the word width.
pub fn frame_len_from_header(header: Word) -> Result<usize, FrameError> {
    let len = header as usize;
    if len < MIN_RESPONSE_WORDS * WORD_BYTES || len % WORD_BYTES != 0 {
        return Err(FrameError::ShortFrame);
    }
    Ok(len)
}

/// Split a response frame into its data region and raw status pair.
///
/// Requires the XOR closure to hold over the whole frame and at least the
/// four-word minimum. The returned words are `(results, status,
/// status_detail)`; interpreting the status against the taxonomy is the
/// caller's concern.
pub fn parse_response(frame: &[Word]) -> Result<(Vec<Word>, Word, Word), FrameError> {
    if frame.len() < MIN_RESPONSE_WORDS {
        return Err(FrameError::ShortFrame);
    }
    if checksum(frame) != 0 {
        return Err(FrameError::BadCrc);
    }
    let crc_index = frame.len() - 1;
    let detail_index = crc_index - 1;
    let status_index = detail_index - 1;
    let results = frame[1..status_index].to_vec();
    Ok((results, frame[status_index], frame[detail_index]))
}

/// Serialize words little-endian.
pub fn words_to_le_bytes(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Deserialize little-endian bytes into words.
///
/// An odd byte count means the wire delivered a torn word.
pub fn words_from_le_bytes(bytes: &[u8]) -> Result<Vec<Word>, FrameError> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(FrameError::ShortFrame);
    }
    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Frame integrity failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameError {
    /// The XOR over the frame is non-zero.
    BadCrc,
    /// The frame is below the minimum length or not word-aligned.
    ShortFrame,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::BadCrc => write!(f, "bad-crc"),
            FrameError::ShortFrame => write!(f, "short-frame"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}
