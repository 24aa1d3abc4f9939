//! Native WebSocket client: `tokio-tungstenite`.
//!
//! Full implementation with:
//! - Background tokio task owning the socket
//! - `req_id` correlation of responses to pending requests
//! - Application-level ping/pong health check
//! - Exponential backoff reconnection with jitter
//! - Session tracking + authorize replay on reconnect
//! - Request queue while reconnecting (flushed once the socket is back)

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::{MessageIn, MessageOut, ReadyState, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Responder = oneshot::Sender<Result<MessageIn, WsError>>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Request {
        req_id: u64,
        msg: MessageOut,
        respond_to: Responder,
    },
    Cancel(u64),
    Disconnect,
}

// ─── Disconnect reasons for reconnection decision ────────────────────────────

enum DisconnectReason {
    UserRequested,
    NormalClose,
    PongTimeout,
    RateLimited,
    Error(String),
}

/// Who is waiting on a `req_id`.
enum Waiter {
    Caller(Responder),
    /// The authorize replayed after a reconnect; nobody awaits it.
    Replay,
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    waiters: HashMap<u64, Waiter>,
    queued: Vec<(u64, MessageOut)>,
    session: Option<MessageOut>,
    req_ids: Arc<AtomicU64>,
    reconnect_attempts: u32,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn emit(&self, event: WsEvent) {
        let _ = self.event_tx.try_send(event);
    }

    fn should_reconnect(&self) -> bool {
        self.config.reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts
    }

    fn next_req_id(&self) -> u64 {
        self.req_ids.fetch_add(1, Ordering::SeqCst)
    }

    /// Register a caller's request before it goes on the wire.
    fn accept(&mut self, req_id: u64, msg: &MessageOut, respond_to: Responder) {
        track_session(&mut self.session, msg);
        self.waiters.insert(req_id, Waiter::Caller(respond_to));
    }

    fn resolve(&mut self, req_id: u64, result: Result<MessageIn, WsError>) {
        if let Some(Waiter::Caller(tx)) = self.waiters.remove(&req_id) {
            let _ = tx.send(result);
        }
    }

    /// Route an inbound message to whoever is waiting on its `req_id`.
    fn dispatch(&mut self, msg: MessageIn) {
        match msg.req_id.and_then(|id| self.waiters.remove(&id)) {
            Some(Waiter::Caller(tx)) => {
                let _ = tx.send(Ok(msg));
            }
            Some(Waiter::Replay) => match &msg.error {
                Some(err) => {
                    tracing::error!("Session replay rejected: {}", err);
                    self.emit(WsEvent::Error(format!("Session replay rejected: {}", err)));
                }
                None => tracing::info!("Session restored after reconnect"),
            },
            None => self.emit(WsEvent::Message(msg)),
        }
    }

    /// Fail every outstanding request; their socket is gone.
    fn fail_waiters(&mut self, code: Option<u16>, reason: &str) {
        self.queued.clear();
        for (_, waiter) in self.waiters.drain() {
            if let Waiter::Caller(tx) = waiter {
                let _ = tx.send(Err(WsError::Closed {
                    code,
                    reason: reason.to_string(),
                }));
            }
        }
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Native WebSocket client using `tokio-tungstenite`.
///
/// Uses a background tokio task for connection management.
/// The public API communicates with it via mpsc channels.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
    req_ids: Arc<AtomicU64>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
            req_ids: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Connect to the WebSocket server.
    ///
    /// Resolves once the first connection is open. Later drops are handled
    /// by the background task (reconnect, authorize replay, queue flush).
    pub async fn connect(&mut self) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            waiters: HashMap::new(),
            queued: Vec::new(),
            session: None,
            req_ids: Arc::clone(&self.req_ids),
            reconnect_attempts: 0,
            ready_state: Arc::clone(&self.ready_state),
        };

        let handle = tokio::spawn(run_task(state, ready_tx));

        match ready_rx.await {
            Ok(Ok(())) => {
                self.cmd_tx = Some(cmd_tx);
                self.task_handle = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(WsError::ConnectionFailed(
                "Connection task ended before connecting".into(),
            )),
        }
    }

    /// Disconnect from the WebSocket server.
    ///
    /// Sends a graceful close to the background task and waits for it to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    /// Send a request and wait for the response carrying the same `req_id`.
    ///
    /// Provider errors come back as a normal [`MessageIn`] with `error` set;
    /// only transport failures are `Err`.
    pub async fn request(&self, msg: MessageOut) -> Result<MessageIn, WsError> {
        let tx = self.cmd_tx.as_ref().ok_or(WsError::NotConnected)?;
        let req_id = self.req_ids.fetch_add(1, Ordering::SeqCst);
        let (respond_to, response) = oneshot::channel();

        tx.send(Command::Request {
            req_id,
            msg,
            respond_to,
        })
        .await
        .map_err(|_| WsError::NotConnected)?;

        let after_ms = self.config.request_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(after_ms), response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(WsError::Closed {
                code: None,
                reason: "Connection task ended".into(),
            }),
            Err(_) => {
                tracing::warn!(req_id, after_ms, "Request timed out");
                let _ = tx.try_send(Command::Cancel(req_id));
                Err(WsError::Timeout { req_id, after_ms })
            }
        }
    }

    /// Whether the WebSocket is currently open.
    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    /// Current connection state.
    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    /// Get a stream of events from the WebSocket connection.
    ///
    /// The returned stream borrows `self`, so it must be dropped
    /// before calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState, ready_tx: oneshot::Sender<Result<(), WsError>>) {
    let mut ready_tx = Some(ready_tx);

    loop {
        // ── 1. Attempt connection ────────────────────────────────────────
        let (sink, stream) = match attempt_connect(&state.config.url).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("WebSocket connection failed: {}", e);
                state.emit(WsEvent::Error(format!("Connection failed: {}", e)));

                // The first connection is reported to `connect()`, never retried.
                if let Some(tx) = ready_tx.take() {
                    state
                        .ready_state
                        .store(ReadyState::Closed as u16, Ordering::SeqCst);
                    let _ = tx.send(Err(WsError::ConnectionFailed(e)));
                    return;
                }

                if state.should_reconnect() {
                    backoff_sleep(&mut state, false).await;
                    if !drain_commands_to_queue(&mut state) {
                        state.fail_waiters(None, "Client disconnect");
                        return;
                    }
                    continue;
                }
                state.emit(WsEvent::MaxReconnectReached);
                state.fail_waiters(None, &e);
                state
                    .ready_state
                    .store(ReadyState::Closed as u16, Ordering::SeqCst);
                return;
            }
        };

        // ── 2. Connected ─────────────────────────────────────────────────
        state.reconnect_attempts = 0;
        state
            .ready_state
            .store(ReadyState::Open as u16, Ordering::SeqCst);
        state.emit(WsEvent::Connected);
        tracing::info!("WebSocket connected");
        if let Some(tx) = ready_tx.take() {
            let _ = tx.send(Ok(()));
        }

        // ── 3. Replay session, then flush queued requests ────────────────
        let mut sink = sink;
        replay_session(&mut state, &mut sink).await;
        flush_queued(&mut state, &mut sink).await;

        // ── 4. Inner select! loop ────────────────────────────────────────
        let reason = run_connected(&mut state, sink, stream).await;

        // ── 5. Post-disconnect decision ──────────────────────────────────
        state
            .ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);

        match reason {
            DisconnectReason::UserRequested | DisconnectReason::NormalClose => {
                state.fail_waiters(Some(1000), "Connection closed");
                return;
            }
            DisconnectReason::RateLimited => {
                state.fail_waiters(Some(1008), "Rate limited");
                if state.should_reconnect() {
                    state
                        .ready_state
                        .store(ReadyState::Connecting as u16, Ordering::SeqCst);
                    backoff_sleep(&mut state, true).await;
                    if !drain_commands_to_queue(&mut state) {
                        state.fail_waiters(None, "Client disconnect");
                        return;
                    }
                    continue;
                }
                state.emit(WsEvent::MaxReconnectReached);
                return;
            }
            DisconnectReason::PongTimeout | DisconnectReason::Error(_) => {
                let why = match &reason {
                    DisconnectReason::Error(e) => e.as_str(),
                    _ => "Pong timeout",
                };
                state.fail_waiters(None, why);
                if state.should_reconnect() {
                    state
                        .ready_state
                        .store(ReadyState::Connecting as u16, Ordering::SeqCst);
                    backoff_sleep(&mut state, false).await;
                    if !drain_commands_to_queue(&mut state) {
                        state.fail_waiters(None, "Client disconnect");
                        return;
                    }
                    continue;
                }
                state.emit(WsEvent::MaxReconnectReached);
                return;
            }
        }
    }
}

/// The inner connected loop. Runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    let ping_dur = Duration::from_millis(state.config.ping_interval_ms as u64);
    let pong_dur = Duration::from_millis(state.config.pong_timeout_ms as u64);

    let mut ping_interval = tokio::time::interval(ping_dur);
    ping_interval.reset(); // skip immediate first tick

    let mut pong_deadline: Option<tokio::time::Instant> = None;

    // Parked far in the future while no pong is outstanding.
    let far_future = tokio::time::Instant::now() + Duration::from_secs(86400);
    let pong_sleep = tokio::time::sleep_until(far_future);
    tokio::pin!(pong_sleep);

    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        match serde_json::from_str::<MessageIn>(text_str) {
                            Ok(msg_in) => {
                                if msg_in.is_pong() {
                                    pong_deadline = None;
                                    pong_sleep.as_mut().reset(far_future);
                                }
                                state.dispatch(msg_in);
                            }
                            Err(e) => {
                                tracing::warn!(
                                    "WS deserialization error: {} (raw: {})",
                                    e,
                                    text_str
                                );
                                state.emit(WsEvent::Error(format!(
                                    "Deserialization error: {}",
                                    e
                                )));
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.emit(WsEvent::Disconnected {
                            code: Some(code),
                            reason: reason.clone(),
                        });
                        return match code {
                            1000 => DisconnectReason::NormalClose,
                            1008 => DisconnectReason::RateLimited,
                            _ => DisconnectReason::Error(reason),
                        };
                    }
                    Some(Ok(_)) => {} // Binary, Frame: ignored
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: reason.clone(),
                        });
                        return DisconnectReason::Error(reason);
                    }
                    None => {
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                        return DisconnectReason::Error("Stream ended".into());
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Request { req_id, msg, respond_to }) => {
                        state.accept(req_id, &msg, respond_to);
                        if let Err(e) = send_msg(&mut sink, Some(req_id), &msg).await {
                            tracing::warn!("Send failed: {}", e);
                            state.resolve(req_id, Err(WsError::SendFailed(e)));
                        }
                    }
                    Some(Command::Cancel(req_id)) => {
                        state.waiters.remove(&req_id);
                    }
                    Some(Command::Disconnect) => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        return DisconnectReason::UserRequested;
                    }
                    None => {
                        // WsClient dropped
                        return DisconnectReason::UserRequested;
                    }
                }
            }

            // ── c) Ping interval ─────────────────────────────────────────
            _ = ping_interval.tick() => {
                if let Err(e) = send_msg(&mut sink, None, &MessageOut::ping()).await {
                    tracing::warn!("Failed to send ping: {}", e);
                } else if pong_deadline.is_none() {
                    let deadline = tokio::time::Instant::now() + pong_dur;
                    pong_deadline = Some(deadline);
                    pong_sleep.as_mut().reset(deadline);
                }
            }

            // ── d) Pong timeout ──────────────────────────────────────────
            () = &mut pong_sleep, if pong_deadline.is_some() => {
                tracing::warn!(
                    "Pong timeout: no response within {}ms",
                    state.config.pong_timeout_ms
                );
                state.emit(WsEvent::Disconnected {
                    code: None,
                    reason: "Pong timeout".into(),
                });
                let _ = sink.close().await;
                return DisconnectReason::PongTimeout;
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Attempt to establish a WebSocket connection with a 30-second timeout.
async fn attempt_connect(
    url: &str,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(30), connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

/// Serialize and send a MessageOut over the sink.
async fn send_msg(
    sink: &mut SplitSink<WsStream, Message>,
    req_id: Option<u64>,
    msg: &MessageOut,
) -> Result<(), String> {
    let json = msg.encode(req_id).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Session tracking ────────────────────────────────────────────────────────

/// Remember the latest authorize so it can be replayed on a fresh socket.
fn track_session(session: &mut Option<MessageOut>, msg: &MessageOut) {
    if msg.is_authorize() {
        tracing::debug!("Tracking session authorize");
        *session = Some(msg.clone());
    }
}

async fn replay_session(state: &mut TaskState, sink: &mut SplitSink<WsStream, Message>) {
    let Some(msg) = state.session.clone() else {
        return;
    };
    let req_id = state.next_req_id();
    state.waiters.insert(req_id, Waiter::Replay);
    tracing::info!("Replaying session authorize");
    if let Err(e) = send_msg(sink, Some(req_id), &msg).await {
        tracing::warn!("Failed to replay session: {}", e);
        state.waiters.remove(&req_id);
    }
}

// ─── Request queue ───────────────────────────────────────────────────────────

async fn flush_queued(state: &mut TaskState, sink: &mut SplitSink<WsStream, Message>) {
    if state.queued.is_empty() {
        return;
    }
    tracing::info!("Flushing {} queued request(s)", state.queued.len());
    let queued = std::mem::take(&mut state.queued);
    for (req_id, msg) in &queued {
        if let Err(e) = send_msg(sink, Some(*req_id), msg).await {
            tracing::warn!("Failed to flush queued request: {}", e);
            state.resolve(*req_id, Err(WsError::SendFailed(e)));
        }
    }
}

/// Move commands that arrived during backoff into the queue.
///
/// Returns `false` when a disconnect was requested.
fn drain_commands_to_queue(state: &mut TaskState) -> bool {
    while let Ok(cmd) = state.cmd_rx.try_recv() {
        match cmd {
            Command::Request {
                req_id,
                msg,
                respond_to,
            } => {
                state.accept(req_id, &msg, respond_to);
                state.queued.push((req_id, msg));
            }
            Command::Cancel(req_id) => {
                state.waiters.remove(&req_id);
                state.queued.retain(|(id, _)| *id != req_id);
            }
            Command::Disconnect => return false,
        }
    }
    true
}

// ─── Reconnection backoff ────────────────────────────────────────────────────

async fn backoff_sleep(state: &mut TaskState, rate_limited: bool) {
    state.reconnect_attempts += 1;

    let exp = (state.reconnect_attempts - 1).min(10);
    let base = state
        .config
        .base_reconnect_delay_ms
        .saturating_mul(1u32 << exp);

    let (jitter_max, cap) = if rate_limited {
        (1000u32, 300_000u32) // up to 5 minutes for rate limits
    } else {
        (500u32, 60_000u32) // up to 60 seconds normally
    };

    let jitter = rand::random::<u32>() % jitter_max;
    let delay = base.saturating_add(jitter).min(cap);

    tracing::warn!(
        "Reconnect attempt {}/{} in {}ms{}",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        delay,
        if rate_limited { " (rate-limited)" } else { "" }
    );

    tokio::time::sleep(Duration::from_millis(delay as u64)).await;
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn task_state() -> (TaskState, mpsc::Sender<Command>, mpsc::Receiver<WsEvent>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let state = TaskState {
            config: WsConfig::default(),
            event_tx,
            cmd_rx,
            waiters: HashMap::new(),
            queued: Vec::new(),
            session: None,
            req_ids: Arc::new(AtomicU64::new(1)),
            reconnect_attempts: 0,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Open as u16)),
        };
        (state, cmd_tx, event_rx)
    }

    fn message(raw: &str) -> MessageIn {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_ws_client_new() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.cmd_tx.is_none());
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_request_when_not_connected() {
        let client = WsClient::new(WsConfig::default());
        let result = client.request(MessageOut::ping()).await;
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let mut client = WsClient::new(WsConfig {
            url: "ws://127.0.0.1:1/websockets/v3".into(),
            reconnect: false,
            ..WsConfig::default()
        });
        let result = client.connect().await;
        assert!(matches!(result, Err(WsError::ConnectionFailed(_))));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_track_session_only_authorize() {
        let mut session = None;
        track_session(&mut session, &MessageOut::ping());
        assert!(session.is_none());

        track_session(&mut session, &MessageOut::authorize("a1"));
        track_session(&mut session, &MessageOut::authorize("a2"));
        assert_eq!(session, Some(MessageOut::authorize("a2")));
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_req_id() {
        let (mut state, _cmd_tx, mut events) = task_state();
        let (tx, rx) = oneshot::channel();
        state.accept(5, &MessageOut::ping(), tx);

        state.dispatch(message(r#"{"msg_type":"ping","ping":"pong","req_id":5}"#));
        let got = rx.await.unwrap().unwrap();
        assert_eq!(got.req_id, Some(5));
        assert!(state.waiters.is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_unsolicited_emits_event() {
        let (mut state, _cmd_tx, mut events) = task_state();
        state.dispatch(message(r#"{"msg_type":"tick","tick":{"quote":1.0}}"#));
        assert!(matches!(events.try_recv(), Ok(WsEvent::Message(m)) if m.msg_type == "tick"));
    }

    #[tokio::test]
    async fn test_fail_waiters_closes_pending() {
        let (mut state, _cmd_tx, _events) = task_state();
        let (tx, rx) = oneshot::channel();
        state.accept(9, &MessageOut::ping(), tx);
        state.waiters.insert(10, Waiter::Replay);
        state.queued.push((9, MessageOut::ping()));

        state.fail_waiters(None, "Stream ended");

        assert!(matches!(
            rx.await.unwrap(),
            Err(WsError::Closed { code: None, reason }) if reason == "Stream ended"
        ));
        assert!(state.waiters.is_empty());
        assert!(state.queued.is_empty());
    }

    #[tokio::test]
    async fn test_drain_commands_queues_requests() {
        let (mut state, cmd_tx, _events) = task_state();
        let (tx, _rx) = oneshot::channel();
        cmd_tx
            .send(Command::Request {
                req_id: 3,
                msg: MessageOut::authorize("tok"),
                respond_to: tx,
            })
            .await
            .unwrap();

        assert!(drain_commands_to_queue(&mut state));
        assert_eq!(state.queued.len(), 1);
        assert!(state.waiters.contains_key(&3));
        assert_eq!(state.session, Some(MessageOut::authorize("tok")));

        cmd_tx.send(Command::Cancel(3)).await.unwrap();
        cmd_tx.send(Command::Disconnect).await.unwrap();
        assert!(!drain_commands_to_queue(&mut state));
        assert!(state.queued.is_empty());
        assert!(state.waiters.is_empty());
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1006);
        assert_eq!(reason, "No close frame");
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut client = WsClient::new(WsConfig::default());
        let result = client.disconnect().await;
        assert!(result.is_ok());
    }
}
