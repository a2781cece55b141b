//! Error types.
//!
//! Two families, matching the two places things can go wrong:
//!
//! - [`RegistryError`] - setup-time configuration mistakes caught by
//!   `reuse::register`. These are developer errors and abort setup loudly.
//! - [`RecordError`] - typed decode failures when a payload is rebuilt
//!   from a loosely-typed key/value record. Delivered to the observer
//!   instead of aborting, so a mismatched producer is diagnosable at
//!   runtime.

use thiserror::Error;

use crate::types::ReuseKind;

/// Configuration errors detected during template registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identifier is already claimed by the other kind namespace.
    #[error(
        "reuse identifier `{identifier}` is registered for {existing:?} views \
         and cannot also serve {requested:?} views"
    )]
    DuplicateKindMismatch {
        identifier: String,
        existing: ReuseKind,
        requested: ReuseKind,
    },

    /// A resource-sourced template was registered before any loader.
    #[error("template `{identifier}` names a resource but no resource loader is installed")]
    NoResourceLoader { identifier: String },

    /// The installed loader could not resolve the named resource.
    #[error("resource `{resource}` for template `{identifier}` could not be resolved")]
    MissingResource {
        identifier: String,
        resource: String,
    },
}

/// Decode failures when reconstructing a payload from a raw record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An expected field is absent from the record.
    #[error("record is missing field `{0}`")]
    MissingField(String),

    /// A field is present but holds the wrong shape of value.
    #[error("record field `{field}` is not a valid {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    /// The record as a whole does not deserialize to the payload type.
    #[error("record does not match the expected payload shape: {0}")]
    Malformed(#[from] serde_json::Error),
}
