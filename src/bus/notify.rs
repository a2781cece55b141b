//! Notification Bus - typed publish/subscribe
//!
//! Type-safety layer over [`crate::bus::broadcast`]. Posting and observing
//! use a concrete payload type; the channel name is a static property of
//! that type, so a post and its observers can never disagree on the key.
//!
//! # API
//!
//! - `post(payload, sender)` - wrap and broadcast on the payload's channel
//! - `observe::<T>(fn)` - subscribe with a typed callback, get a
//!   [`Subscription`] whose release (or drop) deregisters it
//! - `last_posted::<T>()` - most recent payload posted on `T`'s channel
//!
//! Envelopes whose payload does not downcast to the observed type are
//! dropped with a warning. That only happens when two distinct types claim
//! the same channel name; see `observe_record` for payloads that arrive as
//! raw records instead of concrete values.
//!
//! # Example
//!
//! ```ignore
//! use viewbus::bus::{self, Notification};
//!
//! struct StatusChanged { code: u32 }
//! impl Notification for StatusChanged {}
//!
//! let subscription = bus::observe::<StatusChanged, _>(|_sender, payload| {
//!     println!("status: {}", payload.code);
//! });
//!
//! bus::post(StatusChanged { code: 1 }, None);
//! subscription.release();
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::bus::broadcast::{self, Envelope};
use crate::subscription::Subscription;
use crate::types::short_type_name;

// =============================================================================
// NOTIFICATION TRAIT
// =============================================================================

/// A payload type that can travel over the bus.
///
/// The channel name defaults to the type's short name; override it to bind
/// to an externally-defined channel (a host system event, for instance).
pub trait Notification: Any {
    /// Name of the channel this payload is posted and observed on.
    fn channel_name() -> Cow<'static, str>
    where
        Self: Sized,
    {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

// =============================================================================
// LAST-POSTED STATE
// =============================================================================

thread_local! {
    /// Most recent payload per channel, for inspection and tests.
    static LAST_POSTED: RefCell<HashMap<String, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// The most recent payload posted on `T`'s channel, if any.
///
/// Returns `None` when nothing was posted yet, or when the channel's last
/// traffic was a different type (a raw record, say).
pub fn last_posted<T: Notification>() -> Option<Rc<T>> {
    let channel = T::channel_name();
    let payload = LAST_POSTED.with(|last| last.borrow().get(&*channel).cloned())?;
    payload.downcast::<T>().ok()
}

// =============================================================================
// POST / OBSERVE
// =============================================================================

/// Post a payload on its type's channel.
///
/// Fire-and-forget: every live observer of `T` runs synchronously, in
/// registration order, before this returns. Callers posting from a
/// background thread must marshal onto the UI thread first; the bus does
/// no thread-hopping.
pub fn post<T: Notification>(payload: T, sender: Option<Rc<dyn Any>>) {
    let channel = T::channel_name();
    let envelope = Envelope::new(Rc::new(payload), sender);

    LAST_POSTED.with(|last| {
        last.borrow_mut()
            .insert(channel.to_string(), envelope.payload_rc());
    });

    log::trace!("bus: posting {} on `{channel}`", short_type_name::<T>());
    broadcast::post(&channel, envelope);
}

/// Subscribe to payloads of type `T`.
///
/// The callback receives the optional sender and the payload by reference.
/// All live subscriptions for `T` are invoked exactly once per post, in
/// registration order. Releasing (or dropping) the returned handle stops
/// delivery permanently.
pub fn observe<T, F>(callback: F) -> Subscription
where
    T: Notification,
    F: Fn(Option<&dyn Any>, &T) + 'static,
{
    let channel = T::channel_name();
    let handle = broadcast::add_observer(&channel, move |envelope| {
        match envelope.payload().downcast_ref::<T>() {
            Some(payload) => callback(envelope.sender(), payload),
            None => log::warn!(
                "bus: dropping envelope on `{}`: payload is not a {}",
                T::channel_name(),
                short_type_name::<T>()
            ),
        }
    });

    Subscription::new(move || broadcast::remove_observer(handle))
}

/// Clear all observers and last-posted state (for testing).
pub fn reset_bus_state() {
    broadcast::reset_broadcast_state();
    LAST_POSTED.with(|last| last.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================
