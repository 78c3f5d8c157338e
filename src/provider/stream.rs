//! Streaming a CLI's stdout as [`StreamChunk`]s.
//!
//! One driver task per request reads stdout, frames it into lines, hands each
//! line to the provider's [`StreamParser`] and pushes the resulting chunks into
//! a bounded channel. The consumer side of that channel is a [`ChunkStream`].

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::auth::{first_line, is_authentication_error};
use super::line_buffer::LineBuffer;
use super::process::{RequestContext, RequestTracker, terminate};
use super::session::SessionSlot;
use crate::{ProviderId, StreamChunk, Usage};

/// Capacity of the per-request chunk channel
pub const CHUNK_CHANNEL_CAPACITY: usize = 256;

/// Provider-specific translation of stdout lines.
///
/// Implementations keep all accumulation state (tool input fragments, dedup
/// sets, usage) in `self`; one parser value lives for exactly one request.
pub trait StreamParser: Send + 'static {
    /// Translate one stdout line
    fn parse_line(&mut self, line: &str) -> Vec<StreamChunk>;

    /// Usage captured during the stream, released once for the final `Done`
    fn take_usage(&mut self) -> Option<Usage> {
        None
    }

    /// The CLI reported a finished turn (exit status is then not an error)
    fn turn_completed(&self) -> bool {
        false
    }

    /// Chunks held back until stdout closed
    fn finish(&mut self) -> Vec<StreamChunk> {
        Vec::new()
    }
}

/// Cancels one request
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

impl From<CancellationToken> for CancelHandle {
    fn from(token: CancellationToken) -> Self {
        Self(token)
    }
}

/// The chunk sequence of one request.
///
/// Dropping the stream does not stop the CLI; call [`ChunkStream::cancel`]
/// or drain it to the end.
pub struct ChunkStream {
    rx: mpsc::Receiver<StreamChunk>,
    cancel: CancelHandle,
    pid: Option<u32>,
}

impl ChunkStream {
    pub(crate) fn new(rx: mpsc::Receiver<StreamChunk>, cancel: CancelHandle, pid: Option<u32>) -> Self {
        Self { rx, cancel, pid }
    }

    /// A stream that replays fixed chunks (used for stubs and tests)
    pub fn from_chunks(chunks: Vec<StreamChunk>) -> Self {
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            // capacity covers every chunk
            let _ = tx.try_send(chunk);
        }
        Self::new(rx, CancelHandle::default(), None)
    }

    /// A stream fed by the returned sender
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamChunk>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx, CancelHandle::default(), None))
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stop the request; no terminal chunk follows
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Pid of the CLI process serving this stream
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl Stream for ChunkStream {
    type Item = StreamChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Everything the driver needs besides the process and parser
pub(crate) struct DriveOptions {
    pub provider: ProviderId,
    pub timeout: Duration,
    pub grace: Duration,
    /// Latched from `session_active` chunks; `None` for session-less requests
    pub session: Option<Arc<SessionSlot>>,
    pub tracker: Arc<RequestTracker>,
}

/// Why the driver stopped before the CLI exited on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Chunk bookkeeping shared by the read loop and the final classification
struct Emitter {
    tx: mpsc::Sender<StreamChunk>,
    session: Option<Arc<SessionSlot>>,
    session_sent: bool,
    content_seen: bool,
    deferred_error: Option<StreamChunk>,
    provider: ProviderId,
    cancel: CancellationToken,
    deadline: Instant,
}

impl Emitter {
    async fn forward(&mut self, chunk: StreamChunk) -> Result<(), Interrupt> {
        match chunk {
            StreamChunk::SessionActive { ref session_id } => {
                if self.session_sent {
                    return Ok(());
                }
                self.session_sent = true;
                if let Some(slot) = &self.session {
                    if slot.latch(session_id) {
                        info!(provider = %self.provider, session_id = %session_id, "CLI session latched");
                    }
                }
                self.send(chunk).await
            }
            StreamChunk::Error { ref content, .. } => {
                if self.deferred_error.is_none() {
                    self.deferred_error = Some(chunk);
                } else {
                    debug!(provider = %self.provider, "Dropping extra provider error: {}", content);
                }
                Ok(())
            }
            StreamChunk::Done { .. } => Ok(()),
            other => {
                if other.is_content() {
                    self.content_seen = true;
                }
                self.send(other).await
            }
        }
    }

    /// Wait for channel capacity, giving up on cancellation or the deadline.
    ///
    /// A consumer that stops reading must not keep the CLI alive.
    async fn send(&self, chunk: StreamChunk) -> Result<(), Interrupt> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => Err(Interrupt::TimedOut),
            permit = self.tx.reserve() => {
                // A dropped receiver leaves the CLI running until exit or timeout
                if let Ok(permit) = permit {
                    permit.send(chunk);
                }
                Ok(())
            }
        }
    }

    /// Send the terminal chunk; only cancellation drops it
    async fn send_terminal(&self, chunk: StreamChunk) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = self.tx.send(chunk) => {}
        }
    }

    fn auth_error(&self, detail: &str) -> StreamChunk {
        let detail = if detail.is_empty() {
            "authentication required".to_string()
        } else {
            detail.to_string()
        };
        StreamChunk::auth_error(
            format!(
                "{} is not authenticated: {}",
                self.provider.display_name(),
                detail
            ),
            self.provider.auth_command(),
            self.provider.display_name(),
        )
    }
}

/// Run one request to completion. Consumes the process and the parser.
pub(crate) async fn drive<P: StreamParser>(
    mut child: Child,
    mut parser: P,
    ctx: RequestContext,
    opts: DriveOptions,
    tx: mpsc::Sender<StreamChunk>,
) {
    let pid = child.id();
    let deadline = Instant::now() + opts.timeout;

    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let mut emitter = Emitter {
        tx,
        session: opts.session.clone(),
        session_sent: false,
        content_seen: false,
        deferred_error: None,
        provider: opts.provider,
        cancel: ctx.cancel.clone(),
        deadline,
    };

    let read = match child.stdout.take() {
        Some(stdout) => read_stdout(stdout, &mut parser, &mut emitter).await,
        None => {
            warn!(provider = %opts.provider, "CLI stdout was not captured");
            Ok(())
        }
    };

    let outcome = match read {
        Ok(()) => tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Err(Interrupt::TimedOut),
            status = child.wait() => Ok(status),
        },
        Err(interrupt) => Err(interrupt),
    };

    match outcome {
        Err(Interrupt::Cancelled) => {
            info!(provider = %opts.provider, request_id = ctx.request_id, ?pid, "Request cancelled");
            terminate(&mut child, opts.grace).await;
        }
        Err(Interrupt::TimedOut) => {
            warn!(provider = %opts.provider, request_id = ctx.request_id, ?pid, "Request timed out");
            terminate(&mut child, opts.grace).await;
            emitter
                .send_terminal(StreamChunk::error(format!(
                    "{} request timed out after {} ms",
                    opts.provider.display_name(),
                    opts.timeout.as_millis()
                )))
                .await;
        }
        Ok(status) => {
            // exited already; this only reaps a leaked handle
            terminate(&mut child, opts.grace).await;

            let stderr = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };

            let terminal = match status {
                Ok(status) => classify_exit(
                    status.success() || parser.turn_completed(),
                    status.code(),
                    &stderr,
                    &mut parser,
                    &mut emitter,
                ),
                Err(e) => StreamChunk::error(format!(
                    "Failed to wait for {}: {}",
                    opts.provider.display_name(),
                    e
                )),
            };
            debug!(provider = %opts.provider, request_id = ctx.request_id, ?terminal, "Request finished");
            emitter.send_terminal(terminal).await;
        }
    }

    opts.tracker.finish(ctx.request_id);
}

/// Pump stdout through the parser until EOF
async fn read_stdout<R, P>(mut stdout: R, parser: &mut P, emitter: &mut Emitter) -> Result<(), Interrupt>
where
    R: AsyncRead + Unpin,
    P: StreamParser,
{
    let mut lines = LineBuffer::new();
    let mut buf = vec![0u8; 8192];

    loop {
        let read = tokio::select! {
            biased;
            _ = emitter.cancel.cancelled() => return Err(Interrupt::Cancelled),
            _ = tokio::time::sleep_until(emitter.deadline) => return Err(Interrupt::TimedOut),
            read = stdout.read(&mut buf) => read,
        };
        match read {
            Ok(0) => break,
            Ok(n) => {
                for line in lines.push(&buf[..n]) {
                    for chunk in parser.parse_line(&line) {
                        emitter.forward(chunk).await?;
                    }
                }
            }
            Err(e) => {
                warn!("Failed to read CLI stdout: {}", e);
                break;
            }
        }
    }

    if let Some(rest) = lines.finish() {
        for chunk in parser.parse_line(&rest) {
            emitter.forward(chunk).await?;
        }
    }
    for chunk in parser.finish() {
        emitter.forward(chunk).await?;
    }
    Ok(())
}

/// Pick the single terminal chunk for a process that exited on its own
fn classify_exit<P: StreamParser>(
    success: bool,
    code: Option<i32>,
    stderr: &str,
    parser: &mut P,
    emitter: &mut Emitter,
) -> StreamChunk {
    if !success {
        if is_authentication_error(stderr) {
            return emitter.auth_error(first_line(stderr));
        }
        if let Some(err) = emitter.deferred_error.take() {
            return promote_auth(err, emitter);
        }
        let code = code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c));
        let stderr = stderr.trim();
        return if stderr.is_empty() {
            StreamChunk::error(format!(
                "{} exited with {}",
                emitter.provider.display_name(),
                code
            ))
        } else {
            StreamChunk::error(stderr.to_string())
        };
    }

    if let Some(err) = emitter.deferred_error.take() {
        return promote_auth(err, emitter);
    }

    if !emitter.content_seen && is_authentication_error(stderr) {
        return emitter.auth_error(first_line(stderr));
    }

    StreamChunk::done(parser.take_usage())
}

/// Provider-reported errors that read like a login problem get the auth affordance
fn promote_auth(err: StreamChunk, emitter: &Emitter) -> StreamChunk {
    match err {
        StreamChunk::Error {
            ref content,
            auth_command: None,
            ..
        } if is_authentication_error(content) => emitter.auth_error(content),
        other => other,
    }
}
