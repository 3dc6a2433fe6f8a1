//! Wire framing primitives for the M1 protocol stack.
//!
//! This crate provides the lowest layer of the stack: configurable CRC
//! kernels, the on-wire frame layout, and header/attribute bit packing.
//! It performs no I/O and no buffering of its own; it is a pure,
//! allocation-free codec.
//!
//! # Architecture Overview
//!
//! - **`CrcModel` / `CrcEngine`**
//!   A configurable CRC computation (poly, init, refIn, refOut, xorOut)
//!   with both a bitwise and a nibble-table implementation.
//!
//! - **`Attributes`**
//!   Typed view over the two attribute bytes of a frame header
//!   (reliable, fragment, encrypt, priority, compress).
//!
//! - **`Header` / `Frame`**
//!   The fixed 12-byte header and the full on-wire frame, including
//!   `encode`/`decode`.
//!
//! ---
//!
//! # Frame Layout
//!
//! ```text
//! +-----+---------+-----+-----+------+------+----------+-----+-----+----------+------+---------+-------+
//! | SOF | VER/TYPE| SRC | DST | ATTRL| ATTRM| DATA_LEN | SEQ | ACK | RESERVED | CRC8 |  DATA   | CRC16 |
//! +-----+---------+-----+-----+------+------+----------+-----+-----+----------+------+---------+-------+
//! |  1  |    1    |  1  |  1  |  1   |   1  |    2     |  1  |  1  |    1     |  1   |    N    |   2   |
//! +-----+---------+-----+-----+------+------+----------+-----+-----+----------+------+---------+-------+
//! ```
//!
#![cfg_attr(not(test), no_std)]

pub use attr::{Attributes, Reliability};
pub use crc::{CrcEngine, CrcModel, CRC16_CCITT, CRC16_MODBUS, CRC8_MAXIM};
pub use error::{Error, Result};
pub use frame::{crc16_of_frame, crc8_of_header, Frame, Header, HEADER_LEN, SOF, TRAILER_LEN};

mod attr;
mod crc;
mod error;
mod frame;

mod private {
    pub use super::*;

    #[allow(unused_imports)]
    #[cfg(feature = "defmt")]
    pub use ::defmt::{debug, error, info, trace, warn};

    pub use core::error::Error as StdError;
    pub use core::fmt::{Display, Formatter, Result as FmtResult};
    pub use core::result::Result as StdResult;
}
