mod common;

use rtmonitor_connector_rs::realtime::{ClientConfig, RealtimeClient};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

/// Exercises the client against a live RTMonitor endpoint.
///
/// This test verifies that:
/// - The client can establish a connection and complete the handshake
/// - A subscription issued from the connect callback receives pushed updates
///
/// Note: This test is ignored by default as it requires network access.
/// Set RTMONITOR_WS_URL to point it at an endpoint.
#[tokio::test]
#[ignore]
async fn test_live_subscription() {
    common::setup();
    let endpoint = common::get_live_endpoint();

    let (tx, mut rx) = mpsc::channel::<Value>(32);
    let connected = Arc::new(AtomicBool::new(false));

    let client = Arc::new(RealtimeClient::new(ClientConfig { endpoint }));

    let connected_clone = Arc::clone(&connected);
    let subscriber = Arc::clone(&client);
    client
        .onconnect(Arc::new(move || {
            connected_clone.store(true, Ordering::SeqCst);
            println!("Connected to RTMonitor");
            let client = Arc::clone(&subscriber);
            let tx = tx.clone();
            tokio::spawn(async move {
                let status = client
                    .subscribe(
                        "live_test",
                        "A",
                        json!({}),
                        Arc::new(move |frame: Value| {
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = tx.send(frame).await {
                                    println!("Failed to send frame to channel: {}", e);
                                }
                            });
                        }),
                    )
                    .await;
                println!("Subscribe status: {:?}", status);
            });
        }))
        .await;

    client
        .ondisconnect(Arc::new(|| println!("Connection closed")))
        .await;

    client.init().await;

    // Wait for connection to stabilize
    sleep(Duration::from_secs(5)).await;
    assert!(
        connected.load(Ordering::SeqCst),
        "handshake did not complete"
    );

    // Keep receiving messages for a while
    let timeout_duration = Duration::from_secs(30);
    let start = std::time::Instant::now();
    let mut received = 0usize;

    while start.elapsed() < timeout_duration {
        if let Ok(frame) = rx.try_recv() {
            println!("Received frame in loop: {}", frame);
            received += 1;
            if received >= 3 {
                break;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }

    client.disconnect().await;
}
