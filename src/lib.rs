//! Query and update stored stream volumes in an audio server's
//! stream-restore database
//!
//! The server keeps one entry per application name or media role with the
//! volume, mute state and output device a stream of that client starts with.
//! This crate reads those entries and rewrites a single one in replace mode,
//! so every other stored entry stays exactly as it was.
//!
//! - Report every stored client, or a single one
//! - Set an absolute volume or adjust it relative to the current average
//! - Mute, unmute or toggle mute
//! - Move a client to another output device
//!
//! # Quick Start
//!
//! ```no_run
//! use stream_restore_volume::{ClientConfig, ExitStatus, Mutation, Operation, StreamRestoreClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = StreamRestoreClient::websocket(ClientConfig::default());
//!
//!     // Show every stored client
//!     client.run(Operation::report_all(), &mut std::io::stdout()).await?;
//!
//!     // Lower paplay by 10%
//!     let operation = Operation::mutate("paplay", Mutation::AdjustVolume(-0.1));
//!     if client.run(operation, &mut std::io::stdout()).await? == ExitStatus::ClientNotFound {
//!         eprintln!("paplay has no stored entry");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Client**: event loop executing the session's actions on a transport
//! - **Session**: state machine from connection to shutdown, owns the exit status
//! - **Enumerator**: matches stored entries against the operation
//! - **Update**: pure computation of the record to write back
//! - **Transport**: WebSocket bridge, or an in-memory database for tests

mod client;
mod config;
mod enumerator;
mod error;
mod extension;
mod operation;
mod protocol;
mod report;
mod session;
mod transport;
mod types;
mod update;

// Public exports
pub use client::StreamRestoreClient;
pub use config::{ClientConfig, DEFAULT_CLIENT_NAME, DEFAULT_PORT, REQUEST_TIMEOUT, SERVER_ENV};
pub use enumerator::{Decision, Enumerator};
pub use error::{Result, StreamRestoreError};
pub use operation::{Mutation, Operation};
pub use extension::Extension;
pub use report::ReportLine;
pub use session::{Action, ExitStatus, Phase, Session};
pub use transport::{
    ConnectionState, EventSender, MemoryTransport, OperationKind, SessionEvent, Transport,
    WebSocketTransport,
};
pub use types::{
    Category, ChannelMap, ChannelPosition, ChannelVolumes, Record, Volume, CHANNELS_MAX,
    DEFAULT_CHANNELS,
};
