//! Real-time subscription client for the RTMonitor transport-data service.
//!
//! This module provides the client that kiosk and dashboard widgets share to
//! receive live vehicle positions and related push data. One persistent
//! WebSocket connection is multiplexed between all callers through a single
//! client type:
//!
//! - [`RealtimeClient`]: connection lifecycle, handshake, reconnection, and
//!   per-caller routing of replies and pushed updates
//!
//! # Architecture
//!
//! The client owns exactly one connection at a time and provides:
//!
//! - Automatic connection management and recovery (fixed-interval, unlimited
//!   retries)
//! - The `rt_connect` / `rt_connect_ok` protocol handshake on every fresh
//!   transport
//! - Routing of inbound frames to callbacks keyed by `callerId_requestId`
//! - One-shot requests and standing subscriptions over the same connection
//! - Automatic ping/pong handling at the transport layer
//!
//! Subscriptions are deliberately **not** replayed after a reconnect: the
//! pending-call table is cleared on every disconnect, and each caller
//! re-issues its own subscriptions from an
//! [`onconnect`](RealtimeClient::onconnect) callback. That keeps the client
//! ignorant of caller message shapes and puts recovery where the message
//! contents are known.
//!
//! # Usage
//!
//! ```no_run
//! use rtmonitor_connector_rs::realtime::{ClientConfig, RealtimeClient};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(RealtimeClient::new(ClientConfig::default()));
//!
//!     // Subscriptions do not survive a reconnect, so issue them from the
//!     // connect callback and they come back on their own.
//!     let subscriber = Arc::clone(&client);
//!     client
//!         .onconnect(Arc::new(move || {
//!             let client = Arc::clone(&subscriber);
//!             tokio::spawn(async move {
//!                 let status = client
//!                     .subscribe(
//!                         "stop_timetable",
//!                         "A",
//!                         json!({
//!                             "filters": [
//!                                 { "key": "origin_stop_id", "value": "0500CCITY424" }
//!                             ]
//!                         }),
//!                         Arc::new(|frame: serde_json::Value| {
//!                             println!("Vehicle update: {}", frame);
//!                         }),
//!                     )
//!                     .await;
//!                 if !status.is_ok() {
//!                     eprintln!("Subscribe failed: {}", status.reason);
//!                 }
//!             });
//!         }))
//!         .await;
//!
//!     client
//!         .ondisconnect(Arc::new(|| println!("Connection lost")))
//!         .await;
//!
//!     client.init().await;
//!
//!     tokio::signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
//!     client.disconnect().await;
//! }
//! ```
//!
//! # Send status
//!
//! `request`, `subscribe` and `unsubscribe` return a
//! [`SendStatus`](crate::types::SendStatus) synchronously:
//!
//! ```no_run
//! # use rtmonitor_connector_rs::realtime::{ClientConfig, RealtimeClient};
//! # #[tokio::main]
//! # async fn main() {
//! # let client = RealtimeClient::new(ClientConfig::default());
//! let status = client.unsubscribe("stop_timetable_A").await;
//! if !status.is_ok() {
//!     // The frame was dropped, not queued; try again once reconnected.
//!     eprintln!("Unsubscribe not sent: {}", status.reason);
//! }
//! # }
//! ```
//!
//! `rt_ok` means the transport accepted a send attempt, nothing more. There
//! is no delivery acknowledgement in the protocol.
//!
//! # Reconnection Behavior
//!
//! - Unlimited retries, 10 seconds apart, after every unexpected closure
//! - At most one retry timer outstanding at any time
//! - The pending-call table is cleared on every disconnect; connect and
//!   disconnect callbacks persist for the life of the client
//! - An explicit [`disconnect`](RealtimeClient::disconnect) runs the same
//!   close path but suppresses the retry
//!
//! # Message Handling
//!
//! Frames are dispatched from a single event pump, in transport order.
//! Callbacks run on that pump, so they should be thread-safe and quick;
//! anything slow belongs in a task spawned from the callback.

pub mod client;

// Re-export the client types for easier access
pub use client::{
    ClientConfig, DataCallback, LifecycleCallback, RealtimeClient, DEFAULT_ENDPOINT,
};
