// src/exec/output.rs

//! Merged stdout/stderr capture.
//!
//! Both pipes are drained concurrently into one shared buffer. Chunks land in
//! the order they are read, so a single stream's bytes are never reordered and
//! interleaving between the two streams follows arrival order.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::debug;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug)]
pub struct MergedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
    readers: Vec<JoinHandle<io::Result<()>>>,
}

impl MergedOutput {
    /// Take the child's stdout/stderr pipes and start draining them.
    pub fn capture(child: &mut Child) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(pump(stdout, Arc::clone(&buffer))));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(pump(stderr, Arc::clone(&buffer))));
        }

        Self { buffer, readers }
    }

    /// Wait for both pipes to reach EOF.
    ///
    /// Cancel-safe: a reader is only dropped from the set once it has
    /// finished, so a caller may time this out and still call
    /// [`MergedOutput::finish_within`] or [`MergedOutput::into_text`].
    pub async fn drain(&mut self) -> io::Result<()> {
        while let Some(reader) = self.readers.last_mut() {
            let joined = reader.await;
            self.readers.pop();
            match joined {
                Ok(res) => res?,
                Err(join_err) => return Err(io::Error::other(join_err)),
            }
        }
        Ok(())
    }

    /// Everything captured so far.
    pub fn into_text(self) -> String {
        snapshot(&self.buffer)
    }

    /// Give the readers `grace` to drain, then return whatever was captured.
    ///
    /// Used after killing a child: descendants may still hold the pipes open.
    pub async fn finish_within(self, grace: Duration) -> String {
        let buffer = Arc::clone(&self.buffer);
        let readers = self.readers;
        let aborts: Vec<_> = readers.iter().map(|r| r.abort_handle()).collect();

        let drained = tokio::time::timeout(grace, async {
            for reader in readers {
                match reader.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => debug!(error = %e, "output pipe read failed"),
                    Err(e) => debug!(error = %e, "output pipe reader did not complete"),
                }
            }
        })
        .await;

        if drained.is_err() {
            debug!("output pipes still open after grace period; abandoning readers");
            for abort in aborts {
                abort.abort();
            }
        }

        snapshot(&buffer)
    }
}

async fn pump<R>(mut reader: R, sink: Arc<Mutex<Vec<u8>>>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&chunk[..n]);
    }
}

fn snapshot(buffer: &Mutex<Vec<u8>>) -> String {
    let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use std::process::Stdio;
    use std::time::Instant;

    use tokio::process::Command;

    use super::*;

    fn sh(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn finish_within_collects_both_streams() {
        let mut child = sh("printf out; printf err >&2");
        let output = MergedOutput::capture(&mut child);
        child.wait().await.unwrap();

        let text = output.finish_within(Duration::from_secs(5)).await;
        assert_eq!(text.len(), 6);
        assert!(text.contains("out") && text.contains("err"));
    }

    #[tokio::test]
    async fn finish_within_gives_up_on_pipes_held_open() {
        let mut child = sh("printf early; sleep 30 &");
        let output = MergedOutput::capture(&mut child);
        child.wait().await.unwrap();

        let started = Instant::now();
        let text = output.finish_within(Duration::from_millis(200)).await;
        assert_eq!(text, "early");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn timed_out_drain_keeps_what_was_captured() {
        let mut child = sh("printf partial; sleep 30");
        let mut output = MergedOutput::capture(&mut child);

        let drained = tokio::time::timeout(Duration::from_millis(200), output.drain()).await;
        assert!(drained.is_err());

        child.kill().await.unwrap();
        assert_eq!(output.finish_within(Duration::from_secs(5)).await, "partial");
    }
}
