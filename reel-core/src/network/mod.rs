//! Connection lifecycle: framed TCP link, exponential-backoff
//! reconnect, and the supervisor that turns both into an async event
//! source.

pub mod backoff;
pub mod connection;
pub mod supervisor;

pub use backoff::{Backoff, BASE_BACKOFF, MAX_BACKOFF};
pub use connection::{ConnectionInfo, DeckConnection};
pub use supervisor::{DeckHandle, LinkEvent, LinkRequest, Supervisor};
