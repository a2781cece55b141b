//! Bus Module - typed notifications over an untyped broadcast channel
//!
//! - **Broadcast** - name-keyed observer table, untyped envelopes
//! - **Notify** - typed post/observe, channel name derived from the payload type
//! - **Record** - payloads rebuilt from loosely-typed host records
//!
//! All state is thread-local: the bus belongs to the single UI thread and
//! never locks or hops threads.

pub mod broadcast;
pub mod notify;
pub mod record;

pub use broadcast::{add_observer, observer_count, post as post_raw, remove_observer, Envelope, RawHandle};
pub use notify::{last_posted, observe, post, reset_bus_state, Notification};
pub use record::{
    decode_record, observe_record, post_record, require_field, require_i64, require_str,
    FromRecord, Record,
};
