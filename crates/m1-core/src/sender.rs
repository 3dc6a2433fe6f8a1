//! Link sender (C5): build the on-wire buffer from a logical frame and
//! submit it to a link driver.
//!
//! The original pulls the transient send buffer from a runtime pool;
//! here it is a stack-local array sized to `limits::MAX_FRAME_LEN`,
//! since Rust's ownership model needs no arena for a buffer that lives
//! only for the duration of one call.

use crate::limits::MAX_FRAME_LEN;
use crate::link::LinkTx;
use crate::private::*;
use m1_frame::{Frame, Header};

/// Encodes `header`/`payload` and hands the wire bytes to `link`.
///
/// # Errors
///
/// Returns `ArgTooBig` if the encoded frame would not fit in the
/// sender's fixed buffer, or `Io` if the link driver refuses the
/// frame.
pub fn send_frame(link: &mut impl LinkTx, header: Header, payload: &[u8]) -> Result<()> {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let frame = Frame { header, payload };

    let len = frame.encode(&mut buf).map_err(|_| Error::ArgTooBig)?;

    link.tx(&buf[..len])
}
