//! Link receiver (C3): a per-link byte-at-a-time state machine that
//! reconstructs frames, validates both integrity fields, and hands
//! complete frames upward.

use crate::private::*;
use m1_frame::{crc16_of_frame, crc8_of_header, HEADER_LEN, SOF, TRAILER_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitSof,
    InHeader,
    InPayload,
}

/// Per-link parser statistics (§4.3), readable without resetting the
/// parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerStats {
    pub total_bytes: u32,
    pub not_frame_bytes: u32,
    pub sof_ok: u32,
    pub crc8_ok: u32,
    pub crc8_err: u32,
    pub crc16_ok: u32,
    pub crc16_err: u32,
    pub len_overflow: u32,
}

/// Streaming per-link frame parser.
///
/// `CAP` is the link's cache capacity (header + max payload + trailer,
/// rounded up by the caller); it must be at least `HEADER_LEN` for the
/// parser to make progress, which `Framer::new` enforces by falling
/// back to `AwaitSof` rather than writing past the cache.
pub struct Framer<const CAP: usize> {
    state: State,
    cache: [u8; CAP],
    index: usize,
    read_freq: u32,
    max_data_len: usize,
    stats: FramerStats,
}

impl<const CAP: usize> Framer<CAP> {
    /// `max_pkg_size` is the route's configured per-link frame budget
    /// (header + payload + trailer, §3.3); frames whose declared
    /// `data_len` would not fit in that budget are dropped as
    /// `len_overflow`, independent of the hard `CAP` safety bound.
    pub const fn new(read_freq: u32, max_pkg_size: usize) -> Self {
        Self {
            state: State::AwaitSof,
            cache: [0; CAP],
            index: 0,
            read_freq,
            max_data_len: max_pkg_size.saturating_sub(HEADER_LEN + TRAILER_LEN),
            stats: FramerStats {
                total_bytes: 0,
                not_frame_bytes: 0,
                sof_ok: 0,
                crc8_ok: 0,
                crc8_err: 0,
                crc16_ok: 0,
                crc16_err: 0,
                len_overflow: 0,
            },
        }
    }

    pub const fn read_freq(&self) -> u32 {
        self.read_freq
    }

    pub const fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Feeds `bytes` through the state machine; `on_frame` is invoked
    /// once, synchronously, for every complete and CRC16-validated
    /// frame assembled from this call's bytes (a single call may
    /// assemble more than one frame).
    pub fn feed(&mut self, bytes: &[u8], mut on_frame: impl FnMut(&[u8])) {
        for &byte in bytes {
            self.stats.total_bytes += 1;

            match self.state {
                State::AwaitSof => {
                    if byte == SOF {
                        self.cache[0] = byte;
                        self.index = 1;
                        self.state = State::InHeader;
                        self.stats.sof_ok += 1;
                    } else {
                        self.stats.not_frame_bytes += 1;
                    }
                }

                State::InHeader => {
                    if self.index >= CAP {
                        // Cache too small even for a header; cannot happen
                        // with a correctly sized cache, but never write OOB.
                        self.state = State::AwaitSof;
                        self.stats.len_overflow += 1;
                        continue;
                    }

                    self.cache[self.index] = byte;
                    self.index += 1;

                    if self.index == HEADER_LEN {
                        let header: [u8; HEADER_LEN] =
                            self.cache[0..HEADER_LEN].try_into().unwrap();
                        if crc8_of_header(&header) == header[HEADER_LEN - 1] {
                            self.stats.crc8_ok += 1;
                            self.state = State::InPayload;
                        } else {
                            self.stats.crc8_err += 1;
                            self.state = State::AwaitSof;
                        }
                    }
                }

                State::InPayload => {
                    let data_len =
                        u16::from_le_bytes([self.cache[6], self.cache[7]]) as usize;
                    let frame_len = HEADER_LEN + data_len + TRAILER_LEN;

                    if frame_len > CAP || data_len > self.max_data_len {
                        if self.index < frame_len - 1 {
                            self.index += 1;
                        } else {
                            self.state = State::AwaitSof;
                            self.stats.len_overflow += 1;
                        }
                        continue;
                    }

                    self.cache[self.index] = byte;
                    self.index += 1;

                    if self.index == frame_len {
                        let trailer_at = frame_len - TRAILER_LEN;
                        let stored =
                            u16::from_le_bytes([self.cache[trailer_at], self.cache[trailer_at + 1]]);
                        if crc16_of_frame(&self.cache[0..trailer_at]) == stored {
                            self.stats.crc16_ok += 1;
                            on_frame(&self.cache[0..frame_len]);
                        } else {
                            self.stats.crc16_err += 1;
                        }
                        self.state = State::AwaitSof;
                    }
                }
            }
        }
    }
}
