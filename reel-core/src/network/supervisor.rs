//! Reconnecting link supervisor.
//!
//! Owns the connect/announce/pump/backoff loop and exposes the link as
//! an async [`LinkEvent`] source plus a cloneable [`DeckHandle`] for
//! outbound traffic. Dropping the link (peer close, I/O error, or an
//! explicit reset) schedules a reconnect after the current backoff
//! delay; a successful open resets the delay to its base.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::network::backoff::Backoff;
use crate::network::connection::{ConnectionInfo, DeckConnection};
use crate::protocol::{Command, Event};

/// What the supervisor reports to its consumer, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A connection opened and the page identity was announced.
    Open,
    /// An inbound envelope.
    Inbound(Event),
    /// The connection is gone; a reconnect is already scheduled.
    Closed { reason: String },
}

/// Requests the handle feeds into the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkRequest {
    /// Write a command to the current connection (dropped if none).
    Send(Command),
    /// Tear down the current connection to force a resynchronization.
    Reset,
}

/// Cloneable outbound side of a supervised link.
///
/// `send` never returns an error into the caller: with no open
/// connection the command is queued, and a full or closed queue is
/// logged and dropped.
#[derive(Debug, Clone)]
pub struct DeckHandle {
    tx: mpsc::Sender<LinkRequest>,
}

impl DeckHandle {
    /// Build a handle with its request receiver, for wiring a
    /// supervisor (or a test double).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LinkRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn send(&self, command: Command) {
        if let Err(e) = self.tx.try_send(LinkRequest::Send(command)) {
            warn!("outbound command dropped: {e}");
        }
    }

    /// Ask the supervisor to drop the current connection. The backoff
    /// reconnect takes over from there.
    pub fn reset_link(&self) {
        if let Err(e) = self.tx.try_send(LinkRequest::Reset) {
            warn!("link reset dropped: {e}");
        }
    }
}

/// Why a pump loop ended.
enum PumpEnd {
    /// The peer closed or the read side failed.
    Peer(&'static str),
    /// A consumer-side reset request.
    Reset,
    /// The event receiver is gone; shut down.
    ConsumerGone,
    /// Every handle is gone; shut down.
    HandleGone,
}

/// The reconnect loop. Create with [`Supervisor::new`], then drive with
/// [`Supervisor::run`] (typically `tokio::spawn`ed).
#[derive(Debug)]
pub struct Supervisor {
    info: ConnectionInfo,
    announce: Command,
    backoff: Backoff,
    requests: mpsc::Receiver<LinkRequest>,
    events: mpsc::Sender<LinkEvent>,
}

impl Supervisor {
    /// Wire a supervisor for `info`, announcing `announce` as the page
    /// identity on every open before any other traffic.
    pub fn new(
        info: ConnectionInfo,
        announce: Command,
        backoff: Backoff,
    ) -> (Self, DeckHandle, mpsc::Receiver<LinkEvent>) {
        let (handle, requests) = DeckHandle::channel(64);
        let (events, link_rx) = mpsc::channel(64);
        (
            Self {
                info,
                announce,
                backoff,
                requests,
                events,
            },
            handle,
            link_rx,
        )
    }

    pub async fn run(mut self) {
        loop {
            match DeckConnection::connect(&self.info).await {
                Ok(mut conn) => {
                    self.backoff.reset();

                    // The page identity must be the first message, so
                    // the backend knows which event subset to stream.
                    if conn.send(self.announce.clone()).await.is_err() {
                        debug!("announce failed on fresh connection");
                    } else {
                        if self.events.send(LinkEvent::Open).await.is_err() {
                            return;
                        }
                        let end = self.pump(&mut conn).await;
                        let reason = match end {
                            PumpEnd::Peer(reason) => reason,
                            PumpEnd::Reset => "reset requested",
                            PumpEnd::ConsumerGone | PumpEnd::HandleGone => return,
                        };
                        if self
                            .events
                            .send(LinkEvent::Closed {
                                reason: reason.to_string(),
                            })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                }
                Err(e) => {
                    debug!("connect to {} failed: {e}", self.info);
                }
            }

            let delay = self.backoff.advance();
            debug!(
                attempt = self.backoff.attempt(),
                "reconnecting to {} in {delay:?}", self.info
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Shuttle traffic both ways until something ends the connection.
    async fn pump(&mut self, conn: &mut DeckConnection) -> PumpEnd {
        loop {
            tokio::select! {
                inbound = conn.recv() => match inbound {
                    Some(event) => {
                        if self.events.send(LinkEvent::Inbound(event)).await.is_err() {
                            return PumpEnd::ConsumerGone;
                        }
                    }
                    None => return PumpEnd::Peer("connection closed"),
                },
                request = self.requests.recv() => match request {
                    Some(LinkRequest::Send(command)) => {
                        if conn.send(command).await.is_err() {
                            return PumpEnd::Peer("write side closed");
                        }
                    }
                    Some(LinkRequest::Reset) => return PumpEnd::Reset,
                    None => return PumpEnd::HandleGone,
                },
            }
        }
    }
}
