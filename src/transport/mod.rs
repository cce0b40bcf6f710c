//! Transport seam between the session and the audio server
//!
//! A transport only dispatches requests. Every reply comes back later as a
//! [`SessionEvent`] on the channel handed to [`Transport::connect`], so the
//! client loop sees connection changes, extension versions, records and write
//! acknowledgements as one ordered stream.

mod memory;
mod websocket;

pub use memory::MemoryTransport;
pub use websocket::WebSocketTransport;

use crate::error::Result;
use crate::types::Record;
use std::fmt;
use tokio::sync::mpsc;

/// Sending half of the event channel a transport reports on
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Connection state as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Authorizing,
    SettingName,
    Ready,
    Failed(String),
    Terminated,
}

/// Server operations the session dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Connect,
    Query,
    Read,
    Write,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Query => "stream-restore test",
            Self::Read => "stream-restore read",
            Self::Write => "stream-restore write",
        };
        f.write_str(name)
    }
}

/// Everything the session can be told about
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(ConnectionState),
    /// Protocol version of the stream-restore extension; 0 means absent
    ExtensionQueried { version: u32 },
    Record(Record),
    EndOfRecords,
    WriteAcknowledged { key: String },
    /// An operation could not be dispatched or the server rejected it
    OperationFailed { operation: OperationKind, detail: String },
}

/// Dispatch side of a connection to the stream-restore database
///
/// Every method returns as soon as the request is queued. An `Err` means the
/// request could not be dispatched at all.
pub trait Transport {
    /// Start connecting; state changes are reported on `events`
    fn connect(&mut self, events: EventSender) -> Result<()>;

    /// Ask for the stream-restore extension version
    fn query_extension(&mut self) -> Result<()>;

    /// Stream every stored record, followed by [`SessionEvent::EndOfRecords`]
    fn read_records(&mut self) -> Result<()>;

    /// Store `record` in replace mode, leaving every other record untouched
    fn write_replace(&mut self, record: &Record) -> Result<()>;

    fn disconnect(&mut self);
}
