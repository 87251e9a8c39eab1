use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analysis::error::AnalysisError;

/// Caller-owned cancellation signal shared with a running analysis.
///
/// Clones observe the same flag, so the caller keeps one handle and passes
/// another into the analyzer.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err(Cancelled)` once the signal has been raised.
    pub fn check(&self) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}
