//! Subscription Handle - scoped release for bus observers
//!
//! One observer registration, owned as a value. Two states, one-way:
//!
//! - **Active** - the callback is registered and will be invoked.
//! - **Released** - the callback is deregistered, permanently.
//!
//! Release happens either explicitly via [`Subscription::release`] or
//! implicitly when the handle is dropped, so deregistration cannot be
//! forgotten on any exit path.
//!
//! # Example
//!
//! ```ignore
//! use viewbus::bus;
//!
//! let subscription = bus::observe::<StatusChanged, _>(|_, payload| {
//!     println!("code: {}", payload.code);
//! });
//!
//! // ... later, stop listening:
//! subscription.release();
//! ```

use std::fmt;

/// Owning handle for one observer registration.
///
/// Dropping the handle releases it; keep it alive for as long as the
/// callback should fire.
pub struct Subscription {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a deregistration closure. Crate-internal: subscriptions are
    /// only produced by `observe`-style calls.
    pub(crate) fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// Release the subscription now, consuming the handle.
    ///
    /// Posting after this returns never invokes the callback again.
    pub fn release(mut self) {
        self.run_cleanup();
    }

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.cleanup.is_some()
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
