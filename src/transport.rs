//! Abstract persistent message-stream transport consumed by the real-time
//! client, plus the production WebSocket implementation.
//!
//! The client only ever sees text frames going out and [`TransportEvent`]s
//! coming in; everything WebSocket-specific (TLS, ping/pong, close frames)
//! stays inside [`WsTransport`]. Tests inject their own [`Transport`] to
//! script inbound traffic and observe outbound frames.

use crate::error::{Result, RtError};
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use log::*;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

/// One event delivered by a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// An inbound text frame.
    Message(String),
    /// The stream ended, cleanly or not. Read errors collapse into this;
    /// there is no distinct error state downstream of a closure.
    Closed,
}

/// One frame handed to a transport connection for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// An outbound text frame.
    Text(String),
    /// Keepalive reply. Produced internally by [`WsTransport`]; callers
    /// never need to send one.
    Pong(Vec<u8>),
    /// Caller-initiated shutdown of the stream.
    Close,
}

/// A dialer for persistent duplex message streams.
///
/// `connect` resolves to the outbound sender once the stream is open. All
/// subsequent inbound traffic, and exactly one final [`TransportEvent::Closed`],
/// arrive on the `events` channel.
pub trait Transport: Send + Sync + 'static {
    fn connect(
        &self,
        url: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> BoxFuture<'static, Result<mpsc::Sender<OutboundFrame>>>;
}

/// Production transport over `tokio-tungstenite`.
///
/// Splits the stream into a writer task draining the outbound channel and a
/// reader task forwarding text frames, answering pings, and reporting the
/// closure.
pub struct WsTransport;

impl Transport for WsTransport {
    fn connect(
        &self,
        url: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> BoxFuture<'static, Result<mpsc::Sender<OutboundFrame>>> {
        let url = url.to_string();
        Box::pin(async move {
            let url_obj = Url::parse(&url).map_err(RtError::UrlParseError)?;

            info!("Connecting to WebSocket: {}", url_obj);
            let (ws_stream, response) = connect_async(url_obj.as_str()).await.map_err(|e| {
                RtError::WebsocketError(format!("WebSocket connection failed: {}", e))
            })?;
            info!(
                "WebSocket connected successfully. Response: {:?}",
                response.status()
            );

            let (mut write, mut read) = ws_stream.split();

            // Channel for outbound frames to the writer task
            let (tx, mut rx) = mpsc::channel::<OutboundFrame>(32);
            let tx_clone_for_ping = tx.clone(); // Clone sender for the reader task (to send pongs)

            // --- Writer Task ---
            // Drains the outbound channel into the WebSocket sink.
            tokio::spawn(async move {
                while let Some(frame) = rx.recv().await {
                    let message = match frame {
                        OutboundFrame::Text(text) => Message::Text(text),
                        OutboundFrame::Pong(data) => Message::Pong(data),
                        OutboundFrame::Close => {
                            trace!("Sending WS Close frame");
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                    };
                    trace!("Sending WS message: {:?}", message);
                    if let Err(e) = write.send(message).await {
                        error!("WebSocket send error: {}. Stopping writer task.", e);
                        break;
                    }
                }
                info!("WebSocket writer task finished.");
            });

            // --- Reader Task ---
            // Forwards text frames as events, handles Pings, and reports closure.
            tokio::spawn(async move {
                loop {
                    match read.next().await {
                        Some(Ok(msg)) => match msg {
                            Message::Text(text) => {
                                trace!("Received WS Text: {}", text);
                                if events.send(TransportEvent::Message(text)).await.is_err() {
                                    info!("Event consumer gone. Stopping reader task.");
                                    break;
                                }
                            }
                            Message::Binary(bin) => {
                                trace!("Received WS Binary ({} bytes), ignoring", bin.len());
                            }
                            Message::Ping(ping_data) => {
                                trace!("Received WS Ping, sending Pong via channel");
                                if tx_clone_for_ping
                                    .send(OutboundFrame::Pong(ping_data))
                                    .await
                                    .is_err()
                                {
                                    error!("Failed to send Pong: writer channel closed.");
                                    break;
                                }
                            }
                            Message::Pong(_) => {
                                trace!("Received WS Pong");
                            }
                            Message::Close(close_frame) => {
                                warn!("Received WS Close frame: {:?}", close_frame);
                                break;
                            }
                            Message::Frame(_) => { /* Ignore */ }
                        },
                        Some(Err(e)) => {
                            error!("WebSocket read error: {}", e);
                            break;
                        }
                        None => {
                            info!("WebSocket stream ended (read None).");
                            break;
                        }
                    }
                }
                info!("WebSocket reader task finished.");
                let _ = events.send(TransportEvent::Closed).await;
            });

            Ok(tx)
        })
    }
}
