use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use thiserror::Error;

/// Returned by analysis loops when the caller abandoned the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis was cancelled")]
pub struct Cancelled;

/// Shared flag an interactive host flips when a selection goes stale.
///
/// Analyses do not poll the token directly; they take a
/// `&mut dyn FnMut() -> Result<(), Cancelled>` callback and the host usually
/// passes [`CancellationToken::checker`].
#[derive(Debug, Default, Clone)]
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

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// A cancellation callback suitable for the `*_with` analysis entry points.
    pub fn checker(&self) -> impl FnMut() -> Result<(), Cancelled> + '_ {
        move || self.check()
    }
}
