//! Broadcast Channel - untyped, name-keyed observer dispatch
//!
//! The host-channel half of the bus: a process-wide table mapping channel
//! names to observer lists. Everything here is untyped; the typed layer in
//! [`crate::bus::notify`] sits strictly on top.
//!
//! # API
//!
//! - `add_observer(name, fn)` - register, get a [`RawHandle`] back
//! - `remove_observer(handle)` - deregister
//! - `post(name, envelope)` - invoke every observer on the channel,
//!   in registration order, synchronously on the calling thread
//!
//! Dispatch snapshots the observer list before invoking anything, so a
//! callback may remove observers (including itself) or add new ones
//! mid-post. Removals take effect immediately; additions are not seen
//! until the next post.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// =============================================================================
// TYPES
// =============================================================================

/// One broadcast unit: optional sender plus payload, delivered together so
/// the payload's concrete type survives end-to-end.
#[derive(Clone)]
pub struct Envelope {
    sender: Option<Rc<dyn Any>>,
    payload: Rc<dyn Any>,
}

impl Envelope {
    /// Wrap a payload and an optional sender reference.
    pub fn new(payload: Rc<dyn Any>, sender: Option<Rc<dyn Any>>) -> Self {
        Self { sender, payload }
    }

    /// The posting object, if one was attached.
    pub fn sender(&self) -> Option<&dyn Any> {
        self.sender.as_deref()
    }

    /// The payload, still carrying its concrete type behind `dyn Any`.
    pub fn payload(&self) -> &dyn Any {
        &*self.payload
    }

    pub(crate) fn payload_rc(&self) -> Rc<dyn Any> {
        Rc::clone(&self.payload)
    }
}

/// Opaque handle identifying one observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(usize);

type Observer = Rc<dyn Fn(&Envelope)>;

// =============================================================================
// STATE
// =============================================================================

struct ChannelTable {
    /// Per-channel observer lists, in registration order.
    observers: HashMap<String, Vec<(usize, Observer)>>,
    /// Which channel each live handle belongs to.
    owners: HashMap<usize, String>,
    next_id: usize,
}

impl ChannelTable {
    fn new() -> Self {
        Self {
            observers: HashMap::new(),
            owners: HashMap::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static CHANNELS: RefCell<ChannelTable> = RefCell::new(ChannelTable::new());
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Register an observer on a channel. Returns a handle for removal.
pub fn add_observer(channel: &str, observer: impl Fn(&Envelope) + 'static) -> RawHandle {
    CHANNELS.with(|table| {
        let mut table = table.borrow_mut();
        let id = table.next_id();
        table
            .observers
            .entry(channel.to_string())
            .or_default()
            .push((id, Rc::new(observer)));
        table.owners.insert(id, channel.to_string());
        log::debug!("broadcast: observer {id} added on `{channel}`");
        RawHandle(id)
    })
}

/// Deregister an observer. Removing an already-removed handle is a no-op.
pub fn remove_observer(handle: RawHandle) {
    CHANNELS.with(|table| {
        let mut table = table.borrow_mut();
        let Some(channel) = table.owners.remove(&handle.0) else {
            return;
        };
        if let Some(observers) = table.observers.get_mut(&channel) {
            observers.retain(|(id, _)| *id != handle.0);
            if observers.is_empty() {
                table.observers.remove(&channel);
            }
        }
        log::debug!("broadcast: observer {} removed from `{channel}`", handle.0);
    });
}

/// Broadcast an envelope to every observer on `channel`.
///
/// Fire-and-forget: the poster does not learn how many observers ran.
pub fn post(channel: &str, envelope: Envelope) {
    // Snapshot first so callbacks can mutate the table without a
    // re-entrant borrow.
    let snapshot: Vec<(usize, Observer)> = CHANNELS.with(|table| {
        table
            .borrow()
            .observers
            .get(channel)
            .map(|observers| observers.clone())
            .unwrap_or_default()
    });

    log::trace!(
        "broadcast: posting on `{channel}` to {} observer(s)",
        snapshot.len()
    );

    for (id, observer) in snapshot {
        // A callback earlier in this post may have removed this one.
        let still_registered =
            CHANNELS.with(|table| table.borrow().owners.contains_key(&id));
        if still_registered {
            observer(&envelope);
        }
    }
}

/// Number of live observers on a channel.
pub fn observer_count(channel: &str) -> usize {
    CHANNELS.with(|table| {
        table
            .borrow()
            .observers
            .get(channel)
            .map(|observers| observers.len())
            .unwrap_or(0)
    })
}

/// Clear all channels and observers (for testing).
pub fn reset_broadcast_state() {
    CHANNELS.with(|table| {
        let mut table = table.borrow_mut();
        table.observers.clear();
        table.owners.clear();
        table.next_id = 0;
    });
}

// =============================================================================
// TESTS
// =============================================================================
