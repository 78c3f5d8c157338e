//! Child process bookkeeping for running CLI requests.
//!
//! Each adapter owns a [`RequestTracker`] listing its in-flight requests so
//! `cancel_current_request` can reach them. Stopping a CLI always goes through
//! [`terminate`]: SIGTERM first so the CLI can persist its session state, then
//! SIGKILL if it is still alive after the grace period.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-request state passed down the call chain
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: u64,
    pub panel_id: Option<String>,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct InFlight {
    panel_id: Option<String>,
    pid: Option<u32>,
    cancel: CancellationToken,
}

/// In-flight requests of one adapter
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: AtomicU64,
    running: Mutex<HashMap<u64, InFlight>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request and hand out its context
    pub fn begin(&self, panel_id: Option<String>) -> RequestContext {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let mut guard = self.running.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(
            request_id,
            InFlight {
                panel_id: panel_id.clone(),
                pid: None,
                cancel: cancel.clone(),
            },
        );
        RequestContext {
            request_id,
            panel_id,
            cancel,
        }
    }

    pub fn set_pid(&self, request_id: u64, pid: Option<u32>) {
        let mut guard = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = guard.get_mut(&request_id) {
            entry.pid = pid;
        }
    }

    pub fn finish(&self, request_id: u64) {
        let mut guard = self.running.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(&request_id);
    }

    /// Cancel every in-flight request. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let guard = self.running.lock().unwrap_or_else(|e| e.into_inner());
        for (id, entry) in guard.iter() {
            debug!(request_id = id, pid = ?entry.pid, "Cancelling request");
            entry.cancel.cancel();
        }
        guard.len()
    }

    /// Cancel the requests started for one chat panel
    pub fn cancel_panel(&self, panel_id: &str) -> bool {
        let guard = self.running.lock().unwrap_or_else(|e| e.into_inner());
        let mut hit = false;
        for entry in guard.values() {
            if entry.panel_id.as_deref() == Some(panel_id) {
                entry.cancel.cancel();
                hit = true;
            }
        }
        hit
    }

    pub fn in_flight(&self) -> usize {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Pids of the running CLI processes
    pub fn pids(&self) -> Vec<u32> {
        let guard = self.running.lock().unwrap_or_else(|e| e.into_inner());
        guard.values().filter_map(|e| e.pid).collect()
    }
}

/// Stop a CLI process: SIGTERM, wait up to `grace`, then SIGKILL.
///
/// Returns immediately when the process already exited.
pub async fn terminate(child: &mut Child, grace: Duration) {
    if matches!(child.try_wait(), Ok(Some(_))) {
        return;
    }

    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let rc = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
            if rc == 0 {
                match tokio::time::timeout(grace, child.wait()).await {
                    Ok(_) => {
                        debug!(pid, "CLI exited after SIGTERM");
                        return;
                    }
                    Err(_) => warn!(pid, "CLI still running after SIGTERM, sending SIGKILL"),
                }
            }
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    if let Err(e) = child.kill().await {
        warn!("Failed to kill CLI process: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_and_cancels_requests() {
        let tracker = RequestTracker::new();
        let a = tracker.begin(Some("panel-1".into()));
        let b = tracker.begin(None);
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(tracker.in_flight(), 2);

        assert!(tracker.cancel_panel("panel-1"));
        assert!(a.cancel.is_cancelled());
        assert!(!b.cancel.is_cancelled());

        assert_eq!(tracker.cancel_all(), 2);
        assert!(b.cancel.is_cancelled());

        tracker.finish(a.request_id);
        tracker.finish(b.request_id);
        assert_eq!(tracker.in_flight(), 0);
        assert!(!tracker.cancel_panel("panel-1"));
    }

    #[test]
    fn records_pids() {
        let tracker = RequestTracker::new();
        let ctx = tracker.begin(None);
        tracker.set_pid(ctx.request_id, Some(4242));
        assert_eq!(tracker.pids(), vec![4242]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_stops_sleeping_process() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        terminate(&mut child, Duration::from_millis(500)).await;
        assert!(child.try_wait().unwrap().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_escalates_when_sigterm_is_ignored() {
        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg("trap '' TERM; sleep 30")
            .spawn()
            .unwrap();
        // give the shell time to install the trap
        tokio::time::sleep(Duration::from_millis(100)).await;
        terminate(&mut child, Duration::from_millis(200)).await;
        assert!(child.try_wait().unwrap().is_some());
    }
}
