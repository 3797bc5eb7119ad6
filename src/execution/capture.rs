//! Bounded output capture from child pipes.
//!
//! Each pipe gets a reader task that forwards chunks to one collector task.
//! The collector keeps at most `cap` bytes per buffer and discards the rest,
//! so the child never blocks on a full pipe and memory stays bounded.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::result::CapturedOutput;

/// Sentinel appended to a buffer whose stream exceeded the cap.
pub const TRUNCATION_MARKER: &str = "\n[output truncated]\n";

const READ_BUFFER_SIZE: usize = 8192;
const CHANNEL_CAPACITY: usize = 64;

/// How stdout and stderr are captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Separate stdout and stderr buffers, each with its own cap.
    #[default]
    Split,
    /// One buffer in arrival order, reported as stdout.
    Combined,
}

/// Which pipe a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Stdout,
    Stderr,
}

#[derive(Debug)]
struct Chunk {
    source: OutputSource,
    data: Vec<u8>,
}

/// Append-only buffer that stops growing at `cap` bytes.
#[derive(Debug)]
pub struct CappedBuffer {
    bytes: Vec<u8>,
    cap: usize,
    discarded: u64,
}

impl CappedBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            bytes: Vec::new(),
            cap,
            discarded: 0,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        let room = self.cap.saturating_sub(self.bytes.len());
        let take = room.min(data.len());
        self.bytes.extend_from_slice(&data[..take]);
        self.discarded += (data.len() - take) as u64;
    }

    /// Number of bytes dropped past the cap.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn finish(self) -> CapturedOutput {
        let truncated = self.discarded > 0;
        let mut bytes = self.bytes;
        if truncated {
            bytes.extend_from_slice(TRUNCATION_MARKER.as_bytes());
        }
        CapturedOutput { bytes, truncated }
    }
}

/// Handles for an in-flight capture.
pub struct Capture {
    stop_tx: watch::Sender<bool>,
    readers: Vec<tokio::task::JoinHandle<()>>,
    collector: tokio::task::JoinHandle<(CapturedOutput, CapturedOutput)>,
}

impl Capture {
    /// Start pumping both pipes.
    pub fn start<O, E>(stdout: Option<O>, stderr: Option<E>, mode: OutputMode, cap: usize) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Chunk>(CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut readers = Vec::with_capacity(2);
        if let Some(pipe) = stdout {
            readers.push(tokio::spawn(pump(
                pipe,
                OutputSource::Stdout,
                tx.clone(),
                stop_rx.clone(),
            )));
        }
        if let Some(pipe) = stderr {
            readers.push(tokio::spawn(pump(
                pipe,
                OutputSource::Stderr,
                tx.clone(),
                stop_rx,
            )));
        }
        drop(tx);

        let collector = tokio::spawn(collect(rx, mode, cap));

        Self {
            stop_tx,
            readers,
            collector,
        }
    }

    /// Wait up to `grace` for both pipes to reach EOF, then stop reading.
    ///
    /// Returns `(stdout, stderr)`. In combined mode stderr is empty.
    pub async fn finish(self, grace: std::time::Duration) -> (CapturedOutput, CapturedOutput) {
        let Self {
            stop_tx,
            readers,
            collector,
        } = self;

        let all_done = futures_util::future::join_all(readers);
        tokio::pin!(all_done);

        if tokio::time::timeout(grace, &mut all_done).await.is_err() {
            debug!(grace_ms = grace.as_millis() as u64, "pipes still open, stopping readers");
            let _ = stop_tx.send(true);
            all_done.await;
        }

        match collector.await {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "output collector failed");
                (CapturedOutput::default(), CapturedOutput::default())
            }
        }
    }
}

async fn pump<R>(
    mut reader: R,
    source: OutputSource,
    tx: mpsc::Sender<Chunk>,
    mut stop: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = Chunk { source, data: buf[..n].to_vec() };
                    if tx.send(chunk).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(?source, error = %e, "pipe read failed");
                    break;
                }
            },
            _ = stop.changed() => break,
        }
    }
}

async fn collect(
    mut rx: mpsc::Receiver<Chunk>,
    mode: OutputMode,
    cap: usize,
) -> (CapturedOutput, CapturedOutput) {
    let mut stdout = CappedBuffer::new(cap);
    let mut stderr = CappedBuffer::new(cap);

    while let Some(chunk) = rx.recv().await {
        match (mode, chunk.source) {
            (OutputMode::Combined, _) | (OutputMode::Split, OutputSource::Stdout) => {
                stdout.push(&chunk.data)
            }
            (OutputMode::Split, OutputSource::Stderr) => stderr.push(&chunk.data),
        }
    }

    (stdout.finish(), stderr.finish())
}
