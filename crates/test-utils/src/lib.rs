pub mod builders;
pub mod fake_backend;

use std::sync::Once;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use pipevisor::engine::{Emission, StatusPayload};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Receive the next emission, failing the test after 5 seconds.
pub async fn next_emission(rx: &mut mpsc::Receiver<Emission>) -> Emission {
    with_timeout(rx.recv())
        .await
        .expect("outbound channel closed")
}

/// Collect emissions up to and including the next `close` status.
pub async fn collect_until_close(rx: &mut mpsc::Receiver<Emission>) -> Vec<Emission> {
    let mut seen = Vec::new();
    loop {
        let emission = next_emission(rx).await;
        let is_close = matches!(emission.status(), Some(StatusPayload::Close { .. }));
        seen.push(emission);
        if is_close {
            return seen;
        }
    }
}

/// Concatenated data bytes emitted on `topic`.
pub fn data_on(emissions: &[Emission], topic: &str) -> Vec<u8> {
    emissions
        .iter()
        .filter(|e| e.message.topic == topic)
        .filter_map(|e| e.data())
        .flat_map(|d| d.iter().copied())
        .collect()
}
