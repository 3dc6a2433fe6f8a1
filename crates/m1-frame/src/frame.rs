//!
//! On-wire frame layout, encode and decode.
//!
//! This module performs no I/O and allocates no memory. Encoding writes
//! into a caller-supplied buffer; decoding returns a view borrowed from
//! the input slice. CRC verification during decode is the framer's job
//! (see `m1-core`'s `framer` module), not this module's — `decode` only
//! checks structural length.
//!

use crate::crc::compute;
use crate::private::*;

/// Start-of-frame marker.
pub const SOF: u8 = 0x55;

/// Fixed header size in bytes (through and including `crc8`).
pub const HEADER_LEN: usize = 12;

/// Trailer size in bytes (the `crc16` field).
pub const TRAILER_LEN: usize = 2;

/// A logical frame ready to encode, or decoded from wire bytes.
///
/// Field names and meanings follow the wire layout directly; `payload`
/// borrows from whichever buffer backs it (the caller's send buffer on
/// encode, the framer's cache on decode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub version: u8,
    pub data_type: u8,
    pub source_id: u8,
    pub target_id: u8,
    pub attrs: Attributes,
    pub data_len: u16,
    pub seq_num: u8,
    pub ack_num: u8,
}

/// A decoded or to-be-encoded frame: header plus a borrowed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame<'t> {
    pub header: Header,
    pub payload: &'t [u8],
}

impl<'t> Frame<'t> {
    /// Total on-wire length of this frame once encoded.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.payload.len() + TRAILER_LEN
    }

    ///
    /// Serialize into `out`.
    ///
    /// `out` must be exactly `HEADER_LEN + payload.len() + TRAILER_LEN`
    /// bytes; writes the header, copies the payload, then stamps
    /// `crc8` at offset 11 and `crc16` at the tail.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `out` is undersized, or
    /// `InputTooLarge` if the payload does not fit in the `data_len`
    /// field.
    ///
    pub fn encode(&self, out: &mut [u8]) -> Result<usize> {
        if self.payload.len() > u16::MAX as usize {
            return Err(Error::InputTooLarge {
                max: u16::MAX as usize,
            });
        }

        let total = self.wire_len();
        if out.len() < total {
            return Err(Error::BufferTooSmall { need: total });
        }

        let (attr_lsb, attr_msb) = self.header.attrs.encode();
        let data_len = self.payload.len() as u16;
        let len_bytes = data_len.to_le_bytes();

        out[0] = SOF;
        out[1] = (self.header.data_type << 4) | (self.header.version & 0x0F);
        out[2] = self.header.source_id;
        out[3] = self.header.target_id;
        out[4] = attr_lsb;
        out[5] = attr_msb;
        out[6] = len_bytes[0];
        out[7] = len_bytes[1];
        out[8] = self.header.seq_num;
        out[9] = self.header.ack_num;
        out[10] = 0;
        out[11] = compute(CRC8_MAXIM, &out[0..11]) as u8;

        let payload_end = HEADER_LEN + self.payload.len();
        out[HEADER_LEN..payload_end].copy_from_slice(self.payload);

        let crc16 = compute(CRC16_MODBUS, &out[0..payload_end]) as u16;
        out[payload_end..payload_end + TRAILER_LEN].copy_from_slice(&crc16.to_le_bytes());

        #[cfg(feature = "log")]
        trace!(
            "encoded frame: src={} dst={} type={} len={}",
            self.header.source_id, self.header.target_id, self.header.data_type, data_len
        );

        Ok(total)
    }

    ///
    /// Parse `bytes` as a complete frame.
    ///
    /// Does not verify `crc8` or `crc16` — callers that received these
    /// bytes through the streaming framer have already had both
    /// checksums validated during assembly; callers decoding bytes from
    /// elsewhere must verify separately.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEnd` if `bytes` is shorter than the header,
    /// or `InvalidDataLength` if `bytes` does not hold the full frame
    /// implied by the header's `data_len`.
    ///
    pub fn decode(bytes: &'t [u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::UnexpectedEnd { read: bytes.len() });
        }

        let data_len = u16::from_le_bytes([bytes[6], bytes[7]]);
        let total = HEADER_LEN + data_len as usize + TRAILER_LEN;
        if bytes.len() < total {
            return Err(Error::InvalidDataLength {
                expected: data_len as usize,
            });
        }

        let header = Header {
            version: bytes[1] & 0x0F,
            data_type: bytes[1] >> 4,
            source_id: bytes[2],
            target_id: bytes[3],
            attrs: Attributes::decode(bytes[4], bytes[5]),
            data_len,
            seq_num: bytes[8],
            ack_num: bytes[9],
        };

        let payload = &bytes[HEADER_LEN..HEADER_LEN + data_len as usize];

        Ok(Self { header, payload })
    }
}

/// Computes the header CRC8 over the first 11 bytes of a buffer whose
/// 12th byte (offset 11) is the reserved CRC slot.
pub fn crc8_of_header(header_bytes: &[u8; HEADER_LEN]) -> u8 {
    compute(CRC8_MAXIM, &header_bytes[0..11]) as u8
}

/// Computes the trailer CRC16 over `bytes[0..len)`.
pub fn crc16_of_frame(bytes: &[u8]) -> u16 {
    compute(CRC16_MODBUS, bytes) as u16
}
