//! Port allocation for gateway instances.
//!
//! Ports are laid out on a grid: offset `k` owns the window
//! `[BASE_PORT + k * PORT_STEP, BASE_PORT + k * PORT_STEP + FOOTPRINT)`.
//! The gateway port opens the window and the bridge port follows it.

mod allocator;
mod probe;

pub use allocator::PortAllocator;
pub use probe::{LoopbackProbe, PortProbe};

use crate::runtime::constants::ports::{BASE_PORT, FOOTPRINT, PORT_STEP};

/// Gateway port of an offset, unbounded so callers can range-check it.
///
/// Saturates at `u32::MAX` for offsets far past the port space.
pub fn gateway_port_for(offset: u32) -> u32 {
    offset
        .checked_mul(u32::from(PORT_STEP))
        .and_then(|delta| delta.checked_add(u32::from(BASE_PORT)))
        .unwrap_or(u32::MAX)
}

/// Offset owning `gateway_port`, if the port lies on the grid.
pub fn offset_for_gateway(gateway_port: u16) -> Option<u32> {
    let delta = gateway_port.checked_sub(BASE_PORT)?;
    if delta % PORT_STEP == 0 {
        Some(u32::from(delta / PORT_STEP))
    } else {
        None
    }
}

/// Whether the derived-port windows of two gateways intersect.
pub fn footprints_overlap(a: u16, b: u16) -> bool {
    let (a, b) = (u32::from(a), u32::from(b));
    let span = u32::from(FOOTPRINT);
    a < b + span && b < a + span
}
