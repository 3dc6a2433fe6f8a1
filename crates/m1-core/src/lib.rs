//! Link-agnostic framing and messaging orchestration on top of `m1-frame`.
//!
//! This crate owns everything above the wire codec: the per-link
//! streaming framer, routing between local dispatch and forwarding,
//! the reliable-delivery retry engine, the dispatch table, and the
//! single orchestrator (`Stack`) tying them together behind one lock.
//!
//! # Architecture Overview
//!
//! - **`framer::Framer`** — byte-at-a-time state machine reconstructing
//!   frames from a link's raw receive stream.
//! - **`router`** — pure lookup functions deciding local vs. forward.
//! - **`sender`** — builds a wire frame and submits it to a link.
//! - **`reliable::ReliableEngine`** — retry/timeout tracking with
//!   deduplicated, reference-counted payload storage.
//! - **`dispatch::Dispatch`** — fixed-size `data_type` handler table.
//! - **`stack::Stack`** — the orchestrator; owns all mutable state
//!   behind a `critical_section::Mutex<RefCell<_>>` and exposes
//!   `submit`/`tick`/registration.
//!
#![cfg_attr(not(test), no_std)]

pub use dispatch::{Dispatch, Handler, RxView};
pub use error::{Error, Result};
pub use framer::{Framer, FramerStats};
pub use link::{LinkRx, LinkState, LinkTx};
pub use reliable::{ReliableEngine, TrackingRecord, DEFAULT_ACK_WAIT_MS, DEFAULT_MAX_RETRY};
pub use router::{Inbound, Route};
pub use stack::{RouteConfig, Stack, StackConfig, TxOptions};

pub mod limits;

mod dispatch;
mod error;
mod framer;
mod link;
mod reliable;
mod router;
mod sender;
mod stack;

mod private {
    pub use super::*;

    #[allow(unused_imports)]
    #[cfg(feature = "defmt")]
    pub use ::defmt::{debug, error, info, trace, warn};

    pub use core::error::Error as StdError;
    pub use core::fmt::{Display, Formatter, Result as FmtResult};
    pub use core::result::Result as StdResult;
}

#[cfg(test)]
mod tests;
