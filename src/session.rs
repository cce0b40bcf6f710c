use crate::enumerator::{Decision, Enumerator};
use crate::error::{Result, StreamRestoreError};
use crate::operation::Operation;
use crate::extension::Extension;
use crate::report::ReportLine;
use crate::transport::{ConnectionState, SessionEvent};
use crate::types::Record;

/// Final status of one invocation, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// The targeted client has no stored entry
    ClientNotFound,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::ClientNotFound => 1,
            Self::Failure => 2,
        }
    }
}

/// Side effect requested by the session
#[derive(Debug)]
pub enum Action {
    QueryExtension,
    ReadRecords,
    WriteReplace(Record),
    Report(ReportLine),
    /// Stop the loop; emitted exactly once
    Shutdown(Result<ExitStatus>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingReady,
    Querying,
    Enumerating,
    /// All records seen, waiting for write acknowledgements
    Draining,
    Finished,
}

/// State machine for one query-then-update pass over the database
///
/// Each transport event goes through [`Session::handle`], which updates the
/// phase and returns the actions the client loop must carry out.
#[derive(Debug)]
pub struct Session {
    operation: Operation,
    phase: Phase,
    enumerator: Enumerator,
    pending_writes: usize,
    status: Option<ExitStatus>,
}

impl Session {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            phase: Phase::AwaitingReady,
            enumerator: Enumerator::new(),
            pending_writes: 0,
            status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the targeted client was seen during enumeration
    pub fn found(&self) -> bool {
        self.enumerator.found()
    }

    /// Status the session shut down with, once it has
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Action> {
        if self.phase == Phase::Finished {
            tracing::debug!("Ignoring {:?} after shutdown", event);
            return Vec::new();
        }

        match event {
            SessionEvent::StateChanged(state) => self.on_state(state),
            SessionEvent::ExtensionQueried { version } => self.on_extension(version),
            SessionEvent::Record(record) => self.on_record(record),
            SessionEvent::EndOfRecords => self.on_end_of_records(),
            SessionEvent::WriteAcknowledged { key } => self.on_write_acknowledged(&key),
            SessionEvent::OperationFailed { operation, detail } => {
                tracing::error!("{} failed: {}", operation, detail);
                self.shutdown(Err(StreamRestoreError::operation(operation, detail)))
            }
        }
    }

    fn on_state(&mut self, state: ConnectionState) -> Vec<Action> {
        match state {
            ConnectionState::Ready if self.phase == Phase::AwaitingReady => {
                tracing::info!("Connection ready, querying stream-restore");
                self.phase = Phase::Querying;
                vec![Action::QueryExtension]
            }
            ConnectionState::Failed(reason) => {
                tracing::error!("Connection failed: {}", reason);
                self.shutdown(Err(StreamRestoreError::ConnectionFailed(reason)))
            }
            other => {
                tracing::debug!("Connection state {:?}", other);
                Vec::new()
            }
        }
    }

    fn on_extension(&mut self, version: u32) -> Vec<Action> {
        if self.phase != Phase::Querying {
            tracing::warn!("Unexpected extension reply in phase {:?}", self.phase);
            return Vec::new();
        }

        match Extension::from_version(version) {
            Extension::Absent => {
                tracing::info!("stream-restore extension not available");
                self.shutdown(Ok(()))
            }
            Extension::Present { version } => {
                tracing::debug!("stream-restore extension version {}", version);
                self.phase = Phase::Enumerating;
                vec![Action::ReadRecords]
            }
        }
    }

    fn on_record(&mut self, record: Record) -> Vec<Action> {
        if self.phase != Phase::Enumerating {
            tracing::warn!("Unexpected record {} in phase {:?}", record.key, self.phase);
            return Vec::new();
        }

        match self.enumerator.on_record(&self.operation, &record) {
            Decision::Skip => Vec::new(),
            Decision::Report(line) => vec![Action::Report(line)],
            Decision::Write(updated) => {
                self.pending_writes += 1;
                vec![Action::WriteReplace(updated)]
            }
        }
    }

    fn on_end_of_records(&mut self) -> Vec<Action> {
        if self.phase != Phase::Enumerating {
            tracing::warn!("Unexpected end of records in phase {:?}", self.phase);
            return Vec::new();
        }

        if self.pending_writes == 0 {
            return self.shutdown(Ok(()));
        }
        tracing::debug!("Waiting for {} write(s) to be acknowledged", self.pending_writes);
        self.phase = Phase::Draining;
        Vec::new()
    }

    fn on_write_acknowledged(&mut self, key: &str) -> Vec<Action> {
        tracing::debug!("Stored {}", key);
        self.pending_writes = self.pending_writes.saturating_sub(1);

        if self.phase == Phase::Draining && self.pending_writes == 0 {
            return self.shutdown(Ok(()));
        }
        Vec::new()
    }

    /// Finish the session; a success turns into `ClientNotFound` when the
    /// targeted client never showed up
    fn shutdown(&mut self, result: Result<()>) -> Vec<Action> {
        self.phase = Phase::Finished;

        let outcome = result.map(|()| {
            if self.operation.target.is_some() && !self.enumerator.found() {
                ExitStatus::ClientNotFound
            } else {
                ExitStatus::Success
            }
        });
        self.status = Some(match &outcome {
            Ok(status) => *status,
            Err(_) => ExitStatus::Failure,
        });

        vec![Action::Shutdown(outcome)]
    }
}
