//! Routing (C4): local-vs-forward decisions and egress selection.
//!
//! The route table is never mutated at runtime, so these are pure
//! lookup functions over caller-held slices rather than a type that
//! owns state — the stack owns the table and the per-route sequence
//! counters (`stack::StackInner`).

use crate::private::*;

/// A single routing-table entry. `link_id` indexes into the stack's
/// link table; distinct routes may share a `link_id` when one physical
/// link serves several target ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Route {
    pub target_id: u8,
    pub link_id: usize,
    pub max_pkg_size: usize,
    pub read_freq: u32,
}

/// Outcome of routing an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    /// `target_id` matched a local identifier; hand to C6/C7.
    Local,
    /// `target_id` matched a route; forward raw bytes on this link.
    Forward { link_id: usize },
}

/// True if `target_id` is one of this node's own identifiers.
pub fn is_local(local_ids: &[u8], target_id: u8) -> bool {
    local_ids.contains(&target_id)
}

/// Decides how an inbound frame addressed to `target_id` should be
/// handled.
///
/// # Errors
///
/// Returns `NotExist` if `target_id` is neither local nor in the route
/// table.
pub fn route_inbound(local_ids: &[u8], routes: &[Route], target_id: u8) -> Result<Inbound> {
    if is_local(local_ids, target_id) {
        return Ok(Inbound::Local);
    }

    routes
        .iter()
        .find(|route| route.target_id == target_id)
        .map(|route| Inbound::Forward {
            link_id: route.link_id,
        })
        .ok_or(Error::NotExist)
}

/// Finds the route index for an outbound packet addressed to
/// `target_id`.
///
/// # Errors
///
/// Returns `NotExist` if no route matches.
pub fn route_outbound(routes: &[Route], target_id: u8) -> Result<usize> {
    routes
        .iter()
        .position(|route| route.target_id == target_id)
        .ok_or(Error::NotExist)
}
