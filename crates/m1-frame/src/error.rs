//! Error types for the `m1-frame` crate.

use crate::private::*;

/// A specialized `Result` type with `Error`.
pub type Result<T> = StdResult<T, Error>;

///
/// # Error types for frame encoding and decoding.
///
/// ## Position Indicators
///
/// Variants that indicate a position in the input buffer carry a field
/// named consistently with its meaning:
/// - `ReSync` / `MissingHeader` — `skip` is the number of bytes to skip
///   before a resumed scan (see `Error::skip`).
/// - `InvalidChecksum8` / `InvalidChecksum16` — `at` is the offset
///   immediately past the field that failed to verify.
///
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Provided buffer is too small to complete the operation.
    BufferTooSmall { need: usize },
    /// The payload size exceeds the maximum allowed by the wire format.
    InputTooLarge { max: usize },
    /// Encountered an unexpected end of input during parsing.
    UnexpectedEnd { read: usize },
    /// The input stream requires resynchronization.
    ReSync { skip: usize },
    /// Expected start-of-frame marker not found at the current position.
    MissingHeader { skip: usize },
    /// Header CRC8 validation failed.
    InvalidChecksum8 { at: usize },
    /// Trailer CRC16 validation failed.
    InvalidChecksum16 { at: usize },
    /// `data_len` did not match the number of bytes actually available.
    InvalidDataLength { expected: usize },
}

impl Error {
    /// Number of bytes a resynchronizing scanner should skip before
    /// retrying, given this error.
    pub fn skip(&self) -> usize {
        #[cfg(feature = "log")]
        trace!("frame error: {:?}", self);

        match self {
            Self::ReSync { skip } | Self::MissingHeader { skip } => *skip,
            Self::InvalidChecksum8 { .. } | Self::InvalidChecksum16 { .. } => 1,
            _ => 0,
        }
    }
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::BufferTooSmall { need } => {
                write!(f, "insufficient buffer, need {need} bytes at least")
            }
            Self::InputTooLarge { max } => {
                write!(f, "payload exceeds maximum of {max} bytes")
            }
            Self::UnexpectedEnd { read } => {
                write!(f, "unexpected end of data at offset {read}")
            }
            Self::ReSync { skip } => {
                write!(f, "stream requires resynchronization, skipping {skip} bytes")
            }
            Self::MissingHeader { skip } => write!(f, "missing start-of-frame at offset {skip}"),
            Self::InvalidChecksum8 { at } => write!(f, "invalid header CRC8 at offset {at}"),
            Self::InvalidChecksum16 { at } => write!(f, "invalid trailer CRC16 at offset {at}"),
            Self::InvalidDataLength { expected } => {
                write!(f, "invalid data length, expected {expected} bytes")
            }
        }
    }
}
