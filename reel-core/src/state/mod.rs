//! Local mirror of the deck's asynchronous state: the clip table and
//! the transport state machine driven by inbound status events.

pub mod clips;
pub mod transport;

pub use clips::{ClipSlot, ClipTable};
pub use transport::{Phase, StatusEffect, StatusKind, TransportState};
