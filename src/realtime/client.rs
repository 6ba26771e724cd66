use crate::transport::{OutboundFrame, Transport, TransportEvent, WsTransport};
use crate::types::{InboundFrame, SendStatus};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Default endpoint of the RTMonitor vehicle feed.
pub const DEFAULT_ENDPOINT: &str = "wss://smartcambridge.org/rtmonitor/ws";
const RETRY_DELAY_SECS: u64 = 10; // Delay between reconnect attempts

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket URL of the real-time service.
    pub endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Callback receiving each inbound frame routed to a request or subscription.
pub type DataCallback = Arc<dyn Fn(Value) + Send + Sync + 'static>;
/// Callback invoked on connection lifecycle transitions.
pub type LifecycleCallback = Arc<dyn Fn() + Send + Sync + 'static>;

// Type alias for shared sender channel
type SharedSender = Arc<Mutex<Option<mpsc::Sender<OutboundFrame>>>>;
// Type alias for the pending request/subscription table
type PendingCalls = Arc<Mutex<HashMap<String, PendingCall>>>;
type Callbacks = Arc<Mutex<Vec<LifecycleCallback>>>;

/// Connection lifecycle. `Open` means the transport accepted the stream and
/// the handshake is in flight; `Connected` means the service acknowledged it.
/// Sends are gated on transport readiness (`Open` or `Connected`), not on the
/// handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Connected,
}

/// Whether a pending call receives exactly one reply or an open-ended stream
/// of pushes.
enum CallKind {
    OneShot,
    Standing,
}

struct PendingCall {
    kind: CallKind,
    callback: DataCallback,
}

/// Client for the RTMonitor real-time data service.
///
/// Owns exactly one persistent connection at a time and shares it between
/// independent callers: each registers a callback under a composite
/// `callerId_requestId` key and receives the frames addressed to it. The
/// connection manager handles the `rt_connect` handshake and reconnects
/// indefinitely, at a fixed interval, after every unexpected closure.
///
/// The pending-call table does not survive a disconnect. Callers that need
/// their subscriptions back after a reconnect re-issue them from a callback
/// registered with [`onconnect`](RealtimeClient::onconnect).
pub struct RealtimeClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    // Shared sender to allow sending frames while the manager task runs/reconnects
    shared_tx: SharedSender,
    state: Arc<Mutex<ConnectionState>>,
    pending: PendingCalls,
    connect_callbacks: Callbacks,
    disconnect_callbacks: Callbacks,
    // Set by disconnect() to suppress the automatic reconnect
    stop: Arc<AtomicBool>,
    manager_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeClient {
    /// Creates a client speaking to the real WebSocket endpoint in `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(WsTransport))
    }

    /// Creates a client over an injected transport. This is the seam test
    /// doubles plug into; production code uses [`RealtimeClient::new`].
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            shared_tx: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            connect_callbacks: Arc::new(Mutex::new(Vec::new())),
            disconnect_callbacks: Arc::new(Mutex::new(Vec::new())),
            stop: Arc::new(AtomicBool::new(false)),
            manager_handle: Mutex::new(None),
        }
    }

    /// Convenience entry point; equivalent to [`connect`](RealtimeClient::connect).
    pub async fn init(&self) {
        self.connect().await;
    }

    /// Starts the connection manager. Returns immediately; connection
    /// progress is reported through the callbacks registered with
    /// [`onconnect`](RealtimeClient::onconnect) and
    /// [`ondisconnect`](RealtimeClient::ondisconnect).
    ///
    /// Calling this while a manager is already running is a logged no-op, so
    /// a second call can never race a competing connection into existence.
    pub async fn connect(&self) {
        let mut manager = self.manager_handle.lock().await;
        if let Some(handle) = manager.as_ref() {
            if !handle.is_finished() {
                warn!("connect() called while the connection manager is already running; ignoring");
                return;
            }
        }
        self.stop.store(false, Ordering::SeqCst);

        *manager = Some(tokio::spawn({
            // Clone shared state for the manager task
            let endpoint = self.config.endpoint.clone();
            let transport = Arc::clone(&self.transport);
            let shared_tx = Arc::clone(&self.shared_tx);
            let state = Arc::clone(&self.state);
            let pending = Arc::clone(&self.pending);
            let connect_callbacks = Arc::clone(&self.connect_callbacks);
            let disconnect_callbacks = Arc::clone(&self.disconnect_callbacks);
            let stop = Arc::clone(&self.stop);

            async move {
                loop {
                    *state.lock().await = ConnectionState::Connecting;
                    // Fresh event channel per connection attempt; stale events
                    // from a previous connection can never leak into this one.
                    let (event_tx, mut event_rx) = mpsc::channel::<TransportEvent>(32);

                    info!("[Manager] Attempting connection to {}", endpoint);
                    match transport.connect(&endpoint, event_tx).await {
                        Ok(tx) => {
                            if stop.load(Ordering::SeqCst) {
                                info!("[Manager] Disconnect requested during dial; closing.");
                                let _ = tx.send(OutboundFrame::Close).await;
                            } else {
                                *state.lock().await = ConnectionState::Open;
                                *shared_tx.lock().await = Some(tx.clone());

                                let handshake = json!({ "msg_type": "rt_connect" }).to_string();
                                info!("[Manager] Transport open, sending handshake.");
                                if let Err(e) = tx.send(OutboundFrame::Text(handshake)).await {
                                    error!("[Manager] Failed to send handshake: {}", e);
                                } else {
                                    // --- Event pump ---
                                    // Single consumer for all transport events; every
                                    // inbound frame is dispatched from here and nowhere
                                    // else.
                                    while let Some(event) = event_rx.recv().await {
                                        match event {
                                            TransportEvent::Message(text) => {
                                                dispatch_frame(
                                                    &text,
                                                    &state,
                                                    &pending,
                                                    &connect_callbacks,
                                                )
                                                .await;
                                            }
                                            TransportEvent::Closed => {
                                                warn!("[Manager] Transport closed.");
                                                break;
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            error!("[Manager] Failed to establish connection: {}", e);
                        }
                    }

                    // --- Close handling ---
                    // Every disconnect cause funnels through this one path:
                    // failed dial, handshake send failure, transport closure,
                    // explicit disconnect.
                    *state.lock().await = ConnectionState::Disconnected;
                    *shared_tx.lock().await = None;
                    {
                        let mut calls = pending.lock().await;
                        if !calls.is_empty() {
                            debug!(
                                "[Manager] Dropping {} pending call(s) on disconnect",
                                calls.len()
                            );
                            calls.clear();
                        }
                    }
                    let callbacks = disconnect_callbacks.lock().await.clone();
                    for callback in callbacks {
                        callback();
                    }

                    if stop.load(Ordering::SeqCst) {
                        info!("[Manager] Stopped by explicit disconnect.");
                        break;
                    }

                    warn!(
                        "[Manager] Disconnected. Retrying in {} seconds...",
                        RETRY_DELAY_SECS
                    );
                    sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
                    if stop.load(Ordering::SeqCst) {
                        info!("[Manager] Stopped by explicit disconnect.");
                        break;
                    }
                }
                info!("[Manager] Task finished.");
            }
        }));
    }

    /// Registers `callback` to run on every future protocol-acknowledged
    /// connection. Does not fire retroactively if already connected.
    /// Callbacks fire in registration order and persist across reconnects.
    pub async fn onconnect(&self, callback: LifecycleCallback) {
        self.connect_callbacks.lock().await.push(callback);
    }

    /// Registers `callback` to run on every future disconnection, in
    /// registration order.
    pub async fn ondisconnect(&self, callback: LifecycleCallback) {
        self.disconnect_callbacks.lock().await.push(callback);
    }

    /// Closes the active connection. Runs the same close-handling path as an
    /// unexpected closure (disconnect callbacks fire, the pending-call table
    /// is cleared) but suppresses the automatic reconnect.
    pub async fn disconnect(&self) {
        info!("Disconnecting real-time client...");
        self.stop.store(true, Ordering::SeqCst);
        let guard = self.shared_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            let _ = tx.try_send(OutboundFrame::Close);
        }
    }

    /// Sends a one-shot `message` verbatim and registers `callback` under
    /// `callerId_requestId` to receive the next (and only the next) inbound
    /// frame bearing that identifier; the entry is removed after its first
    /// reply. Registration replaces any earlier entry with the same key.
    ///
    /// The returned status only says whether a send could be attempted right
    /// now. On `rt_nok` the message is dropped, not queued.
    pub async fn request(
        &self,
        caller_id: &str,
        request_id: &str,
        message: Value,
        callback: DataCallback,
    ) -> SendStatus {
        let key = composite_key(caller_id, request_id);
        self.pending.lock().await.insert(
            key,
            PendingCall {
                kind: CallKind::OneShot,
                callback,
            },
        );
        self.send_text(message.to_string()).await
    }

    /// Subscribes to a stream of pushed updates. Injects
    /// `msg_type: "rt_subscribe"` and the composite `request_id` into
    /// `message` before sending; `callback` fires once per matching pushed
    /// frame until [`unsubscribe`](RealtimeClient::unsubscribe) or the
    /// connection drops. Registration replaces any earlier entry with the
    /// same key.
    pub async fn subscribe(
        &self,
        caller_id: &str,
        request_id: &str,
        mut message: Value,
        callback: DataCallback,
    ) -> SendStatus {
        let key = composite_key(caller_id, request_id);
        match message.as_object_mut() {
            Some(fields) => {
                fields.insert("msg_type".to_string(), json!("rt_subscribe"));
                fields.insert("request_id".to_string(), json!(key.clone()));
            }
            None => {
                return SendStatus::nok("subscription message must be a JSON object");
            }
        }
        self.pending.lock().await.insert(
            key,
            PendingCall {
                kind: CallKind::Standing,
                callback,
            },
        );
        self.send_text(message.to_string()).await
    }

    /// Sends an unsubscribe control frame for `request_id`.
    ///
    /// The identifier goes on the wire raw, exactly as given; the service
    /// keys unsubscription on it without any caller-id prefix. A caller
    /// targeting one of its own subscriptions passes the composite
    /// `callerId_requestId` it subscribed with. The local pending-call table
    /// is left untouched; the entry goes away with the next disconnect.
    pub async fn unsubscribe(&self, request_id: &str) -> SendStatus {
        let message = json!({
            "msg_type": "rt_unsubscribe",
            "request_id": request_id
        });
        self.send_text(message.to_string()).await
    }

    /// Hands `text` to the transport without blocking, reporting readiness
    /// in the protocol's send-status shape.
    async fn send_text(&self, text: String) -> SendStatus {
        let state = *self.state.lock().await;
        match state {
            ConnectionState::Disconnected => SendStatus::nok("real-time connection is not open"),
            ConnectionState::Connecting => {
                SendStatus::nok("real-time connection still connecting")
            }
            ConnectionState::Open | ConnectionState::Connected => {
                let guard = self.shared_tx.lock().await;
                match guard.as_ref() {
                    Some(tx) => match tx.try_send(OutboundFrame::Text(text)) {
                        Ok(()) => SendStatus::ok("send attempted"),
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            SendStatus::nok("outbound channel full")
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            SendStatus::nok("transport channel closed")
                        }
                    },
                    None => SendStatus::nok("real-time connection is not open"),
                }
            }
        }
    }
}

fn composite_key(caller_id: &str, request_id: &str) -> String {
    format!("{}_{}", caller_id, request_id)
}

/// Routes one inbound text frame. Undecodable text is logged and dropped;
/// nothing in here can take the connection down.
async fn dispatch_frame(
    text: &str,
    state: &Arc<Mutex<ConnectionState>>,
    pending: &PendingCalls,
    connect_callbacks: &Callbacks,
) {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Dropping undecodable frame: {}", e);
            return;
        }
    };

    match InboundFrame::classify(value) {
        InboundFrame::ConnectOk => {
            info!("Real-time service acknowledged handshake.");
            *state.lock().await = ConnectionState::Connected;
            let callbacks = connect_callbacks.lock().await.clone();
            for callback in callbacks {
                callback();
            }
        }
        InboundFrame::Error(frame) => {
            error!("Real-time service reported an error: {}", frame);
        }
        InboundFrame::Data { request_id, frame } => {
            // The entry may have been cleared by an intervening disconnect;
            // a miss is routine, never a fault.
            let mut calls = pending.lock().await;
            let (callback, one_shot) = match calls.get(&request_id) {
                Some(call) => (
                    Some(Arc::clone(&call.callback)),
                    matches!(call.kind, CallKind::OneShot),
                ),
                None => (None, false),
            };
            if one_shot {
                calls.remove(&request_id);
            }
            // Callbacks may re-enter the client (subscribe from a spawned
            // task), so the table lock is released first.
            drop(calls);
            match callback {
                Some(callback) => callback(frame),
                None => {
                    debug!("No pending call for request_id '{}'; dropping frame", request_id);
                }
            }
        }
        InboundFrame::Unroutable(frame) => {
            warn!("Unroutable frame (no request_id, unrecognized msg_type): {}", frame);
        }
    }
}
