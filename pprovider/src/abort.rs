//! Cooperative cancellation flag shared between engine and providers.
//!
//! ```rust
//! use pprovider::AbortSignal;
//!
//! let signal = AbortSignal::new();
//! assert!(!signal.is_aborted());
//! signal.abort();
//! assert!(signal.is_aborted());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Clones share one flag. Providers are expected to check it between chunk
/// emissions and stop work once it is set; setting it is idempotent.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
