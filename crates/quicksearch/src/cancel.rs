//! Request generations and cooperative cancellation.
//!
//! Every configuration change bumps the index generation. Background work
//! captures the generation it was launched under and its results are only
//! applied while that generation is still current.
//!
//! Tokens created from a [`GenerationController`] also report cancellation
//! once the generation has moved on, so a superseded scan stops walking at
//! its next check instead of running to completion only to be discarded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Owns the monotonically increasing request generation of one index.
#[derive(Debug, Clone, Default)]
pub struct GenerationController {
    current: Arc<AtomicU64>,
}

impl GenerationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the generation and returns the new value.
    ///
    /// This invalidates every in-flight task launched under an older one.
    pub fn bump(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current generation without incrementing.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Returns true if `captured` no longer matches the current generation.
    pub fn is_stale(&self, captured: u64) -> bool {
        captured != self.current()
    }

    /// Creates a token bound to the current generation.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            generation: Some(GenerationWatch {
                current: Arc::clone(&self.current),
                captured: self.current(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct GenerationWatch {
    current: Arc<AtomicU64>,
    captured: u64,
}

/// A cancellation token for background scans.
///
/// Clones share the same flag, so the control thread keeps one clone to
/// cancel while the task polls another.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    generation: Option<GenerationWatch>,
}

impl CancellationToken {
    /// Creates a token that is only cancelled explicitly.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            generation: None,
        }
    }

    /// The generation this token was created under, or 0 for standalone tokens.
    pub fn generation(&self) -> u64 {
        self.generation
            .as_ref()
            .map(|watch| watch.captured)
            .unwrap_or(0)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Checks if this token is still active.
    ///
    /// Returns `Some(())` if still active, `None` if cancelled or superseded.
    /// This enables use with the `?` operator for early returns.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            return None;
        }
        match &self.generation {
            Some(watch) if watch.current.load(Ordering::Relaxed) != watch.captured => None,
            _ => Some(()),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
