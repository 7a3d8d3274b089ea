use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Write-once cooperative cancellation flag, threaded explicitly through the
/// optimization loop instead of living in a process-wide global.
///
/// Once set the token never clears; the loop polls it at iteration
/// boundaries only, so an in-flight simulation always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            info!("Cancellation requested: the loop will stop at the next iteration boundary");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Polls the cancellation token and the optional marker stop file once per
/// completed iteration.
#[derive(Debug)]
pub struct InterruptWatcher {
    token: CancelToken,
    stop_file: Option<PathBuf>,
}

impl InterruptWatcher {
    pub fn new(token: CancelToken, stop_file: Option<PathBuf>) -> Self {
        if let Some(path) = &stop_file {
            info!(
                "Run can be interrupted by creating the stop file: {}",
                path.display()
            );
        }
        Self { token, stop_file }
    }

    /// True when the run should stop. A detected stop file is consumed so a
    /// later run does not trip over it.
    pub fn should_stop(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        if let Some(path) = &self.stop_file {
            if path.exists() {
                info!("Stop file detected: {}", path.display());
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Could not remove the stop file ({}): {}", path.display(), e);
                }
                self.token.cancel();
                return true;
            }
        }
        false
    }
}
