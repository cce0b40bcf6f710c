use super::{ConnectionState, EventSender, OperationKind, SessionEvent, Transport};
use crate::config::ClientConfig;
use crate::error::{Result, StreamRestoreError};
use crate::protocol::{
    HelloData, Method, ReadReply, Request, Response, TestReply, UpdateMode, WriteData,
};
use crate::types::Record;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

const TIMEOUT_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// What an outstanding request was for
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Hello,
    Query,
    Read,
    Write { key: String },
}

impl Pending {
    fn operation(&self) -> OperationKind {
        match self {
            Self::Hello => OperationKind::Connect,
            Self::Query => OperationKind::Query,
            Self::Read => OperationKind::Read,
            Self::Write { .. } => OperationKind::Write,
        }
    }

    /// Event reporting that this request failed with `detail`
    fn failure(&self, detail: String) -> SessionEvent {
        match self {
            Self::Hello => SessionEvent::StateChanged(ConnectionState::Failed(detail)),
            other => SessionEvent::OperationFailed {
                operation: other.operation(),
                detail,
            },
        }
    }
}

struct InFlight {
    pending: Pending,
    deadline: Instant,
}

enum Outgoing {
    Request(Request, Pending),
    Close,
}

/// Transport speaking JSON over a WebSocket to a stream-restore bridge
///
/// A background task owns the socket. Requests are queued to it through an
/// unbounded channel and matched to their replies by request id.
pub struct WebSocketTransport {
    config: ClientConfig,
    outgoing: Option<mpsc::UnboundedSender<Outgoing>>,
    task: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            outgoing: None,
            task: None,
        }
    }

    fn queue(&self, request: Request, pending: Pending) -> Result<()> {
        let operation = pending.operation();
        let tx = self
            .outgoing
            .as_ref()
            .ok_or(StreamRestoreError::ConnectionClosed)?;

        tracing::debug!("Queueing {:?} request {}", request.meta.method, request.id());
        tx.send(Outgoing::Request(request, pending))
            .map_err(|_| StreamRestoreError::operation(operation, "connection closed"))
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, events: EventSender) -> Result<()> {
        let url = self.config.url()?;
        let (tx, rx) = mpsc::unbounded_channel();

        events
            .send(SessionEvent::StateChanged(ConnectionState::Connecting))
            .map_err(|_| StreamRestoreError::ConnectionClosed)?;

        let task = tokio::spawn(run_connection(url, self.config.clone(), rx, events));
        self.outgoing = Some(tx);
        self.task = Some(task);
        Ok(())
    }

    fn query_extension(&mut self) -> Result<()> {
        self.queue(Request::new(Method::Test), Pending::Query)
    }

    fn read_records(&mut self) -> Result<()> {
        self.queue(Request::new(Method::Read), Pending::Read)
    }

    fn write_replace(&mut self, record: &Record) -> Result<()> {
        let data = WriteData {
            mode: UpdateMode::Replace,
            apply_immediately: true,
            records: vec![record.clone()],
        };
        let request = Request::new(Method::Write).with_data(serde_json::to_value(&data)?);
        self.queue(
            request,
            Pending::Write {
                key: record.key.clone(),
            },
        )
    }

    fn disconnect(&mut self) {
        if let Some(tx) = self.outgoing.take() {
            let _ = tx.send(Outgoing::Close);
        }
        // the task exits on its own once the close frame is sent
        self.task.take();
    }
}

/// Own the socket: forward queued requests, route replies, expire stale requests
async fn run_connection(
    url: String,
    config: ClientConfig,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: EventSender,
) {
    tracing::info!("Connecting to {}", url);

    let ws_stream = match timeout(config.request_timeout, connect_async(&url)).await {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            tracing::error!("WebSocket error: {}", e);
            let _ = events.send(SessionEvent::StateChanged(ConnectionState::Failed(e.to_string())));
            return;
        }
        Err(_) => {
            let detail = StreamRestoreError::Timeout.to_string();
            let _ = events.send(SessionEvent::StateChanged(ConnectionState::Failed(detail)));
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();
    let mut in_flight: HashMap<Uuid, InFlight> = HashMap::new();

    let _ = events.send(SessionEvent::StateChanged(ConnectionState::Authorizing));

    let hello = HelloData {
        client_name: config.client_name.clone(),
    };
    let hello = match serde_json::to_value(&hello) {
        Ok(data) => Request::new(Method::Hello).with_data(data),
        Err(e) => {
            let _ = events.send(SessionEvent::StateChanged(ConnectionState::Failed(e.to_string())));
            return;
        }
    };
    let mut queued = vec![(hello, Pending::Hello)];

    let _ = events.send(SessionEvent::StateChanged(ConnectionState::SettingName));

    let mut ticker = interval(TIMEOUT_CHECK_INTERVAL);
    loop {
        for (request, pending) in queued.drain(..) {
            let json = match serde_json::to_string(&request) {
                Ok(json) => json,
                Err(e) => {
                    let _ = events.send(pending.failure(e.to_string()));
                    continue;
                }
            };
            tracing::debug!("Sending: {}", json);

            if let Err(e) = write.send(Message::Text(json)).await {
                tracing::error!("Failed to send message: {}", e);
                let _ = events.send(pending.failure(e.to_string()));
                continue;
            }
            in_flight.insert(
                request.id(),
                InFlight {
                    pending,
                    deadline: Instant::now() + config.request_timeout,
                },
            );
        }

        tokio::select! {
            message = outgoing.recv() => match message {
                Some(Outgoing::Request(request, pending)) => queued.push((request, pending)),
                Some(Outgoing::Close) | None => {
                    tracing::info!("Closing connection to {}", url);
                    let _ = write.close().await;
                    let _ = events.send(SessionEvent::StateChanged(ConnectionState::Terminated));
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = handle_message(&mut in_flight, &events, &text) {
                        tracing::error!("Error handling message: {}", e);
                        if matches!(e, StreamRestoreError::ConnectionClosed) {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("WebSocket connection closed");
                    let _ = events.send(SessionEvent::StateChanged(ConnectionState::Terminated));
                    break;
                }
                Some(Err(e)) => {
                    tracing::error!("WebSocket error: {}", e);
                    let failed = ConnectionState::Failed(e.to_string());
                    let _ = events.send(SessionEvent::StateChanged(failed));
                    break;
                }
                Some(Ok(_)) => {}
            },
            _ = ticker.tick() => expire(&mut in_flight, &events, Instant::now()),
        }
    }
}

/// Route a reply to the request waiting for it
fn handle_message(
    in_flight: &mut HashMap<Uuid, InFlight>,
    events: &EventSender,
    text: &str,
) -> Result<()> {
    tracing::debug!("Received: {}", text);

    let response: Response = serde_json::from_str(text)?;
    let Some(request) = in_flight.remove(&response.meta.id) else {
        tracing::debug!("Ignoring unsolicited {:?} message", response.meta.method);
        return Ok(());
    };

    for event in translate(request.pending, response) {
        events
            .send(event)
            .map_err(|_| StreamRestoreError::ConnectionClosed)?;
    }
    Ok(())
}

/// Turn a reply into the session events it stands for
fn translate(pending: Pending, response: Response) -> Vec<SessionEvent> {
    if response.has_errors() {
        let detail = response
            .error_message()
            .unwrap_or_else(|| "unknown error".to_string());
        return vec![pending.failure(detail)];
    }

    match pending {
        Pending::Hello => vec![SessionEvent::StateChanged(ConnectionState::Ready)],
        Pending::Query => match parse_data::<TestReply>(response.data) {
            Ok(reply) => vec![SessionEvent::ExtensionQueried {
                version: reply.version,
            }],
            Err(e) => vec![pending.failure(e.to_string())],
        },
        Pending::Read => match parse_data::<ReadReply>(response.data) {
            Ok(reply) => reply
                .records
                .into_iter()
                .map(SessionEvent::Record)
                .chain(std::iter::once(SessionEvent::EndOfRecords))
                .collect(),
            Err(e) => vec![pending.failure(e.to_string())],
        },
        Pending::Write { key } => vec![SessionEvent::WriteAcknowledged { key }],
    }
}

fn parse_data<T: DeserializeOwned>(data: Option<serde_json::Value>) -> Result<T> {
    let data =
        data.ok_or_else(|| StreamRestoreError::InvalidResponse("No data in response".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

/// Fail every request whose deadline has passed
fn expire(in_flight: &mut HashMap<Uuid, InFlight>, events: &EventSender, now: Instant) {
    let expired: Vec<Uuid> = in_flight
        .iter()
        .filter(|(_, request)| request.deadline <= now)
        .map(|(id, _)| *id)
        .collect();

    for id in expired {
        if let Some(request) = in_flight.remove(&id) {
            tracing::warn!("Request {} ({}) timed out", id, request.pending.operation());
            let _ = events.send(request.pending.failure(StreamRestoreError::Timeout.to_string()));
        }
    }
}
