//! # viewbus
//!
//! Typed reuse registry and notification bus for single-threaded UI toolkits.
//!
//! Two independent facilities, each a thin type-safety layer over an
//! untyped, string-keyed foundation:
//!
//! ```text
//! register::<T>() -> ReuseToken<T> -> dequeue(&token) -> T
//!                 (reuse::registry over reuse::pool)
//!
//! post(payload) -> Envelope -> observers of T, in order
//!               (bus::notify over bus::broadcast)
//! ```
//!
//! - **Reuse registry** - registering a view template type yields an opaque
//!   [`ReuseToken`]; dequeuing requires the token rather than a string, so
//!   the identifier/type relationship cannot be mistyped. Instances are
//!   recycled through per-identifier free lists.
//! - **Notification bus** - posting and observing use a concrete payload
//!   type; [`observe`](bus::observe) returns a [`Subscription`] that
//!   deregisters on release or drop. Payloads arriving as loosely-typed
//!   host records are rebuilt by the payload type itself via
//!   [`FromRecord`](bus::FromRecord), with decode failures surfaced as
//!   typed errors.
//!
//! All state is thread-local. Every call is synchronous and bounded;
//! callers posting from background work must marshal onto the UI thread
//! first.
//!
//! ## Modules
//!
//! - [`types`] - [`ReuseKind`], [`TemplateSource`], name derivation
//! - [`reuse`] - recycle pool and typed registry
//! - [`bus`] - broadcast channel, typed notifications, record payloads
//! - [`subscription`] - scoped observer handle
//! - [`error`] - configuration and decode errors

pub mod bus;
pub mod error;
pub mod reuse;
pub mod subscription;
pub mod types;

// Re-export commonly used items
pub use types::{ReuseKind, TemplateSource};

pub use error::{RecordError, RegistryError};

pub use subscription::Subscription;

pub use reuse::{
    dequeue, recycle, register, reset_registry_state, set_resource_loader, Reusable, ReuseToken,
};

pub use bus::{
    decode_record, last_posted, observe, observe_record, post, post_record, reset_bus_state,
    Envelope, FromRecord, Notification, Record,
};
