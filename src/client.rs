use crate::config::ClientConfig;
use crate::error::{Result, StreamRestoreError};
use crate::operation::Operation;
use crate::session::{Action, ExitStatus, Session};
use crate::transport::{OperationKind, SessionEvent, Transport, WebSocketTransport};
use std::collections::VecDeque;
use std::io::Write;
use tokio::sync::mpsc;

/// Client for the stream-restore database of an audio server
///
/// Runs one session per [`run`](Self::run) call: connect, check for the
/// extension, enumerate the stored entries, report or update the requested
/// client, then disconnect.
pub struct StreamRestoreClient<T> {
    transport: T,
}

impl StreamRestoreClient<WebSocketTransport> {
    /// Client talking to the server described by `config`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stream_restore_volume::{ClientConfig, Mutation, Operation, StreamRestoreClient};
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut client = StreamRestoreClient::websocket(ClientConfig::default());
    ///     let operation = Operation::mutate("paplay", Mutation::SetVolume(0.66));
    ///     let status = client.run(operation, &mut std::io::stdout()).await?;
    ///     println!("exit status {}", status.code());
    ///     Ok(())
    /// }
    /// ```
    pub fn websocket(config: ClientConfig) -> Self {
        Self::new(WebSocketTransport::new(config))
    }
}

impl<T: Transport> StreamRestoreClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run one session for `operation`, writing report lines to `out`
    ///
    /// Returns `Ok` with [`ExitStatus::Success`] or
    /// [`ExitStatus::ClientNotFound`]; every failure is an `Err`.
    pub async fn run<W: Write>(&mut self, operation: Operation, out: &mut W) -> Result<ExitStatus> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = Session::new(operation);
        // dispatch failures are fed back before the next transport event
        let mut deferred: VecDeque<SessionEvent> = VecDeque::new();

        self.transport.connect(tx)?;

        loop {
            let event = match deferred.pop_front() {
                Some(event) => event,
                None => match rx.recv().await {
                    Some(event) => event,
                    None => {
                        tracing::error!("Event channel closed before the session finished");
                        self.transport.disconnect();
                        return Err(StreamRestoreError::ConnectionClosed);
                    }
                },
            };

            for action in session.handle(event) {
                match action {
                    Action::QueryExtension => {
                        if let Err(e) = self.transport.query_extension() {
                            deferred.push_back(dispatch_failed(OperationKind::Query, e));
                        }
                    }
                    Action::ReadRecords => {
                        if let Err(e) = self.transport.read_records() {
                            deferred.push_back(dispatch_failed(OperationKind::Read, e));
                        }
                    }
                    Action::WriteReplace(record) => {
                        if let Err(e) = self.transport.write_replace(&record) {
                            deferred.push_back(dispatch_failed(OperationKind::Write, e));
                        }
                    }
                    Action::Report(line) => {
                        if let Err(e) = writeln!(out, "{}", line) {
                            self.transport.disconnect();
                            return Err(e.into());
                        }
                    }
                    Action::Shutdown(outcome) => {
                        self.transport.disconnect();
                        out.flush()?;
                        return outcome;
                    }
                }
            }
        }
    }
}

fn dispatch_failed(operation: OperationKind, error: StreamRestoreError) -> SessionEvent {
    let detail = match error {
        StreamRestoreError::Operation { detail, .. } => detail,
        other => other.to_string(),
    };
    SessionEvent::OperationFailed { operation, detail }
}
