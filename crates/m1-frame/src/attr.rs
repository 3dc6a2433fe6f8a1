//! Bit packing for the frame's two attribute bytes.
//!
//! ```text
//! attr_lsb: reliable:2 | fragment:1 | encrypt:2 | priority:3
//! attr_msb: compress:2 | reserved:6
//! ```

use crate::private::*;

/// Reliable-delivery request/acknowledge state carried in `attr_lsb`.
///
/// The wire field is 2 bits wide and only values 0/1/2 are defined; value
/// 3 cannot be excluded by the wire format, so decoding maps it to
/// `None` rather than rejecting the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reliability {
    /// Not a reliable packet.
    #[default]
    None = 0,
    /// Reliable request; receiver must ack.
    Request = 1,
    /// Ack frame; carries no payload.
    Ack = 2,
}

impl Reliability {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Self::Request,
            2 => Self::Ack,
            _ => Self::None,
        }
    }

    const fn bits(self) -> u8 {
        self as u8
    }
}

/// Delivery attributes packed into the frame's two attribute bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attributes {
    pub reliable: Reliability,
    pub fragment: bool,
    pub encrypt: u8,
    pub priority: u8,
    pub compress: u8,
}

impl Attributes {
    /// Unpacks `attr_lsb`/`attr_msb` as they appear on the wire.
    pub fn decode(attr_lsb: u8, attr_msb: u8) -> Self {
        let reliable_bits = attr_lsb & 0b11;
        if reliable_bits == 0b11 {
            #[cfg(feature = "log")]
            warn!("attr_lsb carries reserved reliable value 3, decoding as None");
        }

        Self {
            reliable: Reliability::from_bits(reliable_bits),
            fragment: (attr_lsb >> 2) & 0b1 != 0,
            encrypt: (attr_lsb >> 3) & 0b11,
            priority: (attr_lsb >> 5) & 0b111,
            compress: attr_msb & 0b11,
        }
    }

    /// Packs into the on-wire `(attr_lsb, attr_msb)` pair.
    pub fn encode(self) -> (u8, u8) {
        let attr_lsb = self.reliable.bits()
            | ((self.fragment as u8) << 2)
            | ((self.encrypt & 0b11) << 3)
            | ((self.priority & 0b111) << 5);
        let attr_msb = self.compress & 0b11;
        (attr_lsb, attr_msb)
    }
}
