// tests/common.rs
use std::sync::Once;

static INIT: Once = Once::new();

// Initializes logging and environment variables for testing.
// Uses std::sync::Once to ensure it only runs once across all tests.
pub fn setup() {
    INIT.call_once(|| {
        let _ = dotenv::from_path(".env");
        env_logger::builder().is_test(true).try_init().ok();
    });
}

#[allow(dead_code)]
pub fn get_live_endpoint() -> String {
    std::env::var("RTMONITOR_WS_URL")
        .unwrap_or_else(|_| panic!("RTMONITOR_WS_URL environment variable not set"))
}
