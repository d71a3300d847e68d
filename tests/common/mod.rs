#![allow(dead_code)]

pub use scriptdeck_test_utils::{builders, fake_invoker, init_tracing};

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Names of every entry left in `dir`.
pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("scratch dir readable")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect()
}
