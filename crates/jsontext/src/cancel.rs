//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable cancellation signal shared between an owner and any number of
/// reader/writer instances.
///
/// Operations that may touch the underlying source or sink check the token
/// before doing anything else; a token that is already canceled makes the
/// call report [`Canceled`] without mutating any state or producing output.
/// Cancellation is a distinct outcome, not a fault: the instance remains
/// usable if the token is never triggered again.
///
/// ```rust
/// use jsontext::CancelToken;
///
/// let token = CancelToken::new();
/// let watcher = token.clone();
/// assert!(!watcher.is_canceled());
/// token.cancel();
/// assert!(watcher.is_canceled());
/// ```
///
/// [`Canceled`]: crate::ReaderError::Canceled
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
