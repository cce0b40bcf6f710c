use super::{ConnectionState, EventSender, OperationKind, SessionEvent, Transport};
use crate::error::{Result, StreamRestoreError};
use crate::types::Record;
use std::collections::HashSet;

/// In-process stream-restore database
///
/// Replies are queued on the event channel synchronously, in the order a real
/// server would send them. Failures can be injected per operation, either at
/// dispatch time or as an error reply.
#[derive(Debug)]
pub struct MemoryTransport {
    records: Vec<Record>,
    extension_version: u32,
    connect_failure: Option<String>,
    failing: HashSet<OperationKind>,
    rejecting: HashSet<OperationKind>,
    writes: Vec<Record>,
    reads: usize,
    events: Option<EventSender>,
}

impl MemoryTransport {
    /// Empty database with the extension present
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            extension_version: 1,
            connect_failure: None,
            failing: HashSet::new(),
            rejecting: HashSet::new(),
            writes: Vec::new(),
            reads: 0,
            events: None,
        }
    }

    /// Database pre-populated with `records`, enumerated in this order
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut transport = Self::new();
        transport.records.extend(records);
        transport
    }

    /// Report this extension version; 0 pretends the extension is not loaded
    pub fn with_extension_version(mut self, version: u32) -> Self {
        self.extension_version = version;
        self
    }

    /// Enter the failed connection state instead of becoming ready
    pub fn with_connection_failure(mut self, reason: impl Into<String>) -> Self {
        self.connect_failure = Some(reason.into());
        self
    }

    /// Refuse to dispatch `operation`
    pub fn failing_dispatch(mut self, operation: OperationKind) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Dispatch `operation` but answer it with an error reply
    pub fn rejecting(mut self, operation: OperationKind) -> Self {
        self.rejecting.insert(operation);
        self
    }

    /// Current database contents
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Stored record for `key`
    pub fn record(&self, key: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    /// Every record written so far, in write order
    pub fn writes(&self) -> &[Record] {
        &self.writes
    }

    /// How many enumerations were dispatched
    pub fn read_count(&self) -> usize {
        self.reads
    }

    pub fn is_connected(&self) -> bool {
        self.events.is_some()
    }

    fn check_dispatch(&self, operation: OperationKind) -> Result<()> {
        if self.failing.contains(&operation) {
            return Err(StreamRestoreError::operation(operation, "dispatch refused"));
        }
        if operation != OperationKind::Connect && self.events.is_none() {
            return Err(StreamRestoreError::ConnectionClosed);
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) -> Result<()> {
        self.events
            .as_ref()
            .ok_or(StreamRestoreError::ConnectionClosed)?
            .send(event)
            .map_err(|_| StreamRestoreError::ConnectionClosed)
    }

    /// Queue an error reply if `operation` is set up to be rejected
    fn reject(&self, operation: OperationKind) -> Result<bool> {
        if !self.rejecting.contains(&operation) {
            return Ok(false);
        }
        self.emit(SessionEvent::OperationFailed {
            operation,
            detail: "rejected by server".to_string(),
        })?;
        Ok(true)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, events: EventSender) -> Result<()> {
        self.check_dispatch(OperationKind::Connect)?;
        self.events = Some(events);

        for state in [
            ConnectionState::Connecting,
            ConnectionState::Authorizing,
            ConnectionState::SettingName,
        ] {
            self.emit(SessionEvent::StateChanged(state))?;
        }
        let last = match &self.connect_failure {
            Some(reason) => ConnectionState::Failed(reason.clone()),
            None => ConnectionState::Ready,
        };
        self.emit(SessionEvent::StateChanged(last))
    }

    fn query_extension(&mut self) -> Result<()> {
        self.check_dispatch(OperationKind::Query)?;
        if self.reject(OperationKind::Query)? {
            return Ok(());
        }
        self.emit(SessionEvent::ExtensionQueried {
            version: self.extension_version,
        })
    }

    fn read_records(&mut self) -> Result<()> {
        self.check_dispatch(OperationKind::Read)?;
        self.reads += 1;
        if self.reject(OperationKind::Read)? {
            return Ok(());
        }
        for record in &self.records {
            self.emit(SessionEvent::Record(record.clone()))?;
        }
        self.emit(SessionEvent::EndOfRecords)
    }

    fn write_replace(&mut self, record: &Record) -> Result<()> {
        self.check_dispatch(OperationKind::Write)?;
        if self.reject(OperationKind::Write)? {
            return Ok(());
        }

        match self.records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => *existing = record.clone(),
            None => self.records.push(record.clone()),
        }
        self.writes.push(record.clone());

        self.emit(SessionEvent::WriteAcknowledged {
            key: record.key.clone(),
        })
    }

    fn disconnect(&mut self) {
        self.events = None;
    }
}
