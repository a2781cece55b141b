//! Recycle Pool - untyped identifier-keyed template store
//!
//! The host-pool half of the reuse registry: identifier -> template entries,
//! each with a free list of recycled instances. Dequeue pops the free list
//! first and only builds a fresh instance when it is empty.
//!
//! Everything here is untyped (`Box<dyn Any>`); the capability layer in
//! [`crate::reuse::registry`] sits strictly on top and is the intended API.
//!
//! Resource-sourced templates resolve through a loader installed with
//! [`set_resource_loader`]. The resource name is passed through unmodified,
//! and whether it matches what the external tool configured is a documented
//! trust boundary, not something the pool can verify.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RegistryError;
use crate::types::{ReuseKind, TemplateSource};

// =============================================================================
// TYPES
// =============================================================================

/// Builds a fresh instance when the free list is empty.
pub type TemplateFactory = Rc<dyn Fn() -> Box<dyn Any>>;

/// Resolves a named external resource to an instance, or `None` when the
/// name is unknown.
pub type ResourceLoader = Rc<dyn Fn(&str) -> Option<Box<dyn Any>>>;

struct PoolEntry {
    kind: ReuseKind,
    source: TemplateSource,
    factory: TemplateFactory,
    /// Recycled instances, reused LIFO.
    free: Vec<Box<dyn Any>>,
}

struct Pool {
    entries: HashMap<String, PoolEntry>,
    loader: Option<ResourceLoader>,
}

impl Pool {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            loader: None,
        }
    }
}

thread_local! {
    static POOL: RefCell<Pool> = RefCell::new(Pool::new());
}

// =============================================================================
// RESOURCE LOADER
// =============================================================================

/// Install the loader that resolves resource-sourced templates.
///
/// Must be called before registering any `TemplateSource::Resource`
/// template; replacing the loader affects subsequent registrations and
/// dequeues. The loader runs while the pool is borrowed during
/// registration probes, so it must not call back into pool functions.
pub fn set_resource_loader(loader: impl Fn(&str) -> Option<Box<dyn Any>> + 'static) {
    POOL.with(|pool| {
        pool.borrow_mut().loader = Some(Rc::new(loader));
    });
}

/// Resolve a named resource through the installed loader.
pub fn load_resource(name: &str) -> Option<Box<dyn Any>> {
    let loader = POOL.with(|pool| pool.borrow().loader.clone())?;
    loader(name)
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Register (or idempotently re-register) a template.
///
/// Identifier uniqueness spans both kind namespaces: an identifier already
/// claimed by the other kind is rejected. Re-registering an identifier
/// under its existing kind with the same source keeps the entry (and its
/// recycled instances); a changed source overwrites the entry and drops
/// the now-suspect free list.
///
/// Resource sources are verified here, loudly, at setup time: a missing
/// loader or an unresolvable name is a configuration error. The probe
/// instance resolved during verification seeds the free list.
pub fn register_template(
    identifier: &str,
    kind: ReuseKind,
    source: TemplateSource,
    factory: TemplateFactory,
) -> Result<(), RegistryError> {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();

        if let Some(entry) = pool.entries.get(identifier) {
            if entry.kind != kind {
                return Err(RegistryError::DuplicateKindMismatch {
                    identifier: identifier.to_string(),
                    existing: entry.kind,
                    requested: kind,
                });
            }
            if entry.source == source {
                log::debug!("pool: `{identifier}` already registered, keeping entry");
                return Ok(());
            }
        }

        // Verify resource sources now rather than at first dequeue.
        let mut free = Vec::new();
        if let TemplateSource::Resource(resource) = &source {
            let loader =
                pool.loader
                    .clone()
                    .ok_or_else(|| RegistryError::NoResourceLoader {
                        identifier: identifier.to_string(),
                    })?;
            let probe = loader(resource).ok_or_else(|| RegistryError::MissingResource {
                identifier: identifier.to_string(),
                resource: resource.clone(),
            })?;
            free.push(probe);
        }

        log::debug!("pool: registering {kind:?} template `{identifier}` from {source:?}");
        pool.entries.insert(
            identifier.to_string(),
            PoolEntry {
                kind,
                source,
                factory,
                free,
            },
        );
        Ok(())
    })
}

// =============================================================================
// DEQUEUE / RECYCLE
// =============================================================================

enum Dequeued {
    Recycled(Box<dyn Any>),
    Build(TemplateFactory),
}

/// Take an instance for `identifier`, preferring a recycled one.
///
/// Returns `None` when the identifier is unknown or registered under a
/// different kind. Fresh instances are built outside the pool borrow so a
/// factory may itself call back into the pool (a resource factory calling
/// [`load_resource`], for instance).
pub fn dequeue_instance(identifier: &str, kind: ReuseKind) -> Option<Box<dyn Any>> {
    let action = POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        let entry = pool.entries.get_mut(identifier)?;
        if entry.kind != kind {
            return None;
        }
        Some(match entry.free.pop() {
            Some(instance) => Dequeued::Recycled(instance),
            None => Dequeued::Build(Rc::clone(&entry.factory)),
        })
    })?;

    match action {
        Dequeued::Recycled(instance) => {
            log::trace!("pool: dequeued recycled `{identifier}`");
            Some(instance)
        }
        Dequeued::Build(factory) => {
            log::trace!("pool: building fresh `{identifier}`");
            Some(factory())
        }
    }
}

/// Return a used instance to the identifier's free list.
///
/// Instances recycled for an unknown identifier (the pool was reset, say)
/// are quietly dropped.
pub fn recycle_instance(identifier: &str, instance: Box<dyn Any>) {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        match pool.entries.get_mut(identifier) {
            Some(entry) => entry.free.push(instance),
            None => log::debug!("pool: dropping recycled instance for unknown `{identifier}`"),
        }
    });
}

// =============================================================================
// LOOKUPS
// =============================================================================

/// Kind namespace an identifier is registered under, if any.
pub fn registered_kind(identifier: &str) -> Option<ReuseKind> {
    POOL.with(|pool| pool.borrow().entries.get(identifier).map(|entry| entry.kind))
}

/// Number of registered templates.
pub fn template_count() -> usize {
    POOL.with(|pool| pool.borrow().entries.len())
}

/// Number of recycled instances waiting for an identifier.
pub fn free_count(identifier: &str) -> usize {
    POOL.with(|pool| {
        pool.borrow()
            .entries
            .get(identifier)
            .map(|entry| entry.free.len())
            .unwrap_or(0)
    })
}

/// Clear all entries and the loader (for testing).
pub fn reset_pool_state() {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        pool.entries.clear();
        pool.loader = None;
    });
}

// =============================================================================
// TESTS
// =============================================================================
