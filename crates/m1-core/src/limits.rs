//! Fixed capacities for the stack's bounded arenas.
//!
//! The original design draws every transient and retry-tracking
//! allocation from a single runtime-sized byte pool. Rust's ownership
//! model removes the need for that for purely transient buffers (see
//! `sender`), and the no_std/no-alloc constraint means the remaining
//! persistent arena (retry payload storage, see `reliable`) is sized at
//! compile time instead. These consts are that sizing; raise them if a
//! deployment needs more routes, links, or in-flight reliable packets.

/// Maximum number of routing-table entries.
pub const MAX_ROUTES: usize = 8;
/// Maximum number of distinct physical links.
pub const MAX_LINKS: usize = 8;
/// Maximum number of identifiers considered "local" to this node.
pub const MAX_LOCAL_IDS: usize = 4;
/// Maximum number of outstanding reliable tracking records.
pub const MAX_TRACKING: usize = 16;
/// Maximum number of distinct payload records held for retry.
pub const POOL_SLOTS: usize = 16;
/// Maximum payload length a reliable record can retain for retry.
pub const MAX_PAYLOAD_LEN: usize = 256;
/// Maximum on-wire frame length (header + max payload + trailer).
pub const MAX_FRAME_LEN: usize = m1_frame::HEADER_LEN + MAX_PAYLOAD_LEN + m1_frame::TRAILER_LEN;
/// Default dispatch table size (next multiple of 16 above the highest
/// `data_type` tag in use); raise if more than 16 tags are registered.
pub const MAX_DATA_TYPES: usize = 16;
/// Per-tick scratch buffer size for a single `rx` call.
pub const SCRATCH_LEN: usize = if MAX_FRAME_LEN > 128 {
    MAX_FRAME_LEN
} else {
    128
};
/// Frames fully assembled within a single tick's `rx` batch, per link.
pub const MAX_PENDING_FRAMES: usize = 4;
/// Distinct source ids tracked for inbound reliable de-duplication.
pub const MAX_DEDUPE_SOURCES: usize = 8;
