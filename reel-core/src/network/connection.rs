//! A single framed TCP connection to the deck backend.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::warn;

use crate::codec::EnvelopeCodec;
use crate::error::ReelError;
use crate::protocol::{Command, Event};

/// One open control link: a framed stream split into background reader
/// and writer tasks bridged by channels.
#[derive(Debug)]
pub struct DeckConnection {
    // Channel to send commands to the background writer task
    tx: mpsc::Sender<Command>,
    // Channel to receive events from the background reader task
    rx: mpsc::Receiver<Event>,
}

impl DeckConnection {
    pub fn new(stream: TcpStream) -> Self {
        let (mut net_writer, mut net_reader) = Framed::new(stream, EnvelopeCodec).split();

        // User -> Network
        let (user_tx, mut outbound_rx) = mpsc::channel::<Command>(64);

        // Network -> User
        let (inbound_tx, user_rx) = mpsc::channel::<Event>(64);

        // Writer task: User -> Network
        tokio::spawn(async move {
            while let Some(command) = outbound_rx.recv().await {
                if let Err(e) = net_writer.send(command).await {
                    warn!("link write error: {e}");
                    break;
                }
            }
        });

        // Reader task: Network -> User
        tokio::spawn(async move {
            while let Some(result) = net_reader.next().await {
                match result {
                    Ok(event) => {
                        if inbound_tx.send(event).await.is_err() {
                            // user_rx was dropped, stop reading
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("link read error: {e}");
                        break;
                    }
                }
            }
        });

        Self {
            tx: user_tx,
            rx: user_rx,
        }
    }

    /// Queue a command for the writer task.
    pub async fn send(&self, command: Command) -> Result<(), ReelError> {
        self.tx.send(command).await.map_err(ReelError::from)
    }

    /// Next inbound event; `None` once the link is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Open a TCP connection to the backend.
    pub async fn connect(info: &ConnectionInfo) -> Result<Self, std::io::Error> {
        let stream = TcpStream::connect(info.socket_string()).await?;
        Ok(Self::new(stream))
    }
}

/// Address of the deck backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
