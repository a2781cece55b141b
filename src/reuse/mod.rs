//! Reuse Module - identifier-safe view recycling
//!
//! - **Pool** - untyped identifier-keyed template store with free lists
//! - **Registry** - phantom-typed capability tokens over the pool
//!
//! Registration happens once at setup; dequeue and recycle run on the
//! single UI thread afterwards. Nothing here locks.

pub mod pool;
pub mod registry;

pub use pool::{load_resource, set_resource_loader, ResourceLoader, TemplateFactory};
pub use registry::{dequeue, recycle, register, reset_registry_state, Reusable, ReuseToken};
