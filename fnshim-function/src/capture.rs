//! Output accumulators for the spawned server
//!
//! Each invocation owns one [`OutputCapture`] holding two append-only text
//! buffers, one per output stream. Pump tasks decode every chunk read from
//! the child's pipes and append it in arrival order; the handler takes a
//! snapshot once, when it builds the response, and then seals the capture.
//! A sealed capture keeps draining the pipes but drops what it reads.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Output stream of the child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

#[derive(Default)]
struct CaptureState {
    stdout: Mutex<String>,
    stderr: Mutex<String>,
    changed: Notify,
    sealed: AtomicBool,
}

/// Pair of append-only accumulators shared between pump tasks and the handler
#[derive(Clone, Default)]
pub struct OutputCapture {
    state: Arc<CaptureState>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer(&self, stream: OutputStream) -> &Mutex<String> {
        match stream {
            OutputStream::Stdout => &self.state.stdout,
            OutputStream::Stderr => &self.state.stderr,
        }
    }

    /// Decode a chunk and append it to the stream's buffer
    pub fn append(&self, stream: OutputStream, chunk: &[u8]) {
        if chunk.is_empty() || self.is_sealed() {
            return;
        }
        self.buffer(stream)
            .lock()
            .push_str(&String::from_utf8_lossy(chunk));
        self.state.changed.notify_waiters();
    }

    pub fn stdout(&self) -> String {
        self.state.stdout.lock().clone()
    }

    pub fn stderr(&self) -> String {
        self.state.stderr.lock().clone()
    }

    pub fn len(&self, stream: OutputStream) -> usize {
        self.buffer(stream).lock().len()
    }

    pub fn is_empty(&self, stream: OutputStream) -> bool {
        self.buffer(stream).lock().is_empty()
    }

    /// Stop accumulating; later chunks are still read from the pipes and dropped
    pub fn seal(&self) {
        self.state.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.state.sealed.load(Ordering::Acquire)
    }

    /// Stdout if anything was written to it, otherwise stderr
    pub fn body(&self) -> String {
        if self.is_empty(OutputStream::Stdout) {
            self.stderr()
        } else {
            self.stdout()
        }
    }

    /// Whether either stream contains `marker`
    pub fn contains(&self, marker: &str) -> bool {
        self.state.stdout.lock().contains(marker) || self.state.stderr.lock().contains(marker)
    }

    /// Resolve once either stream contains `marker`
    pub async fn wait_for(&self, marker: &str) {
        loop {
            let notified = self.state.changed.notified();
            tokio::pin!(notified);
            // Register before checking so an append in between is not missed
            notified.as_mut().enable();

            if self.contains(marker) {
                return;
            }
            notified.await;
        }
    }

    /// Spawn a task draining `reader` into the stream's buffer until EOF
    pub fn pump<R>(&self, stream: OutputStream, mut reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let capture = self.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK_SIZE];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => {
                        debug!(stream = stream.as_str(), "Output stream closed");
                        break;
                    }
                    Ok(n) => {
                        trace!(stream = stream.as_str(), bytes = n, "Captured output chunk");
                        capture.append(stream, &buf[..n]);
                    }
                    Err(e) => {
                        debug!(stream = stream.as_str(), error = %e, "Output stream read failed");
                        break;
                    }
                }
            }
        })
    }
}
