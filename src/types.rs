//! Core types shared by the reuse registry and the notification bus.
//!
//! These are the small vocabulary types everything else builds on.
//! They carry no behavior beyond identity - the interesting logic lives
//! in [`crate::reuse`] and [`crate::bus`].

// =============================================================================
// Reuse Kind
// =============================================================================

/// The two non-interchangeable families of reusable views.
///
/// A reuse identifier lives in exactly one kind namespace. Registering the
/// same identifier under the other kind is a configuration error, which is
/// what prevents a header template from ever being dequeued as a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReuseKind {
    /// Row content (the scrolling body of a list).
    Row,
    /// Header/footer content framing a section.
    HeaderFooter,
}

// =============================================================================
// Template Source
// =============================================================================

/// Where a registered template's instances come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A code-defined template: fresh instances are built with `Default`.
    Class,
    /// A named external resource. Instances are resolved through the
    /// loader installed with [`crate::reuse::pool::set_resource_loader`];
    /// the name is passed through unmodified.
    Resource(String),
}

// =============================================================================
// Type-Name Derivation
// =============================================================================

/// Short name of a type: the final path segment of `std::any::type_name`.
///
/// `my_app::cards::CardTemplate` becomes `CardTemplate`. Generic parameters
/// are kept as written, so generic payload types that want a stable channel
/// or reuse identifier should override the trait method instead of relying
/// on this.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

// =============================================================================
// TESTS
// =============================================================================
