//! Reuse Registry - typed capability layer over the recycle pool
//!
//! Registering a template type hands back a phantom-typed
//! [`ReuseToken<T>`]; dequeuing requires that token instead of a string,
//! so the identifier/type relationship cannot be forgotten or mistyped.
//!
//! # API
//!
//! - `register::<T>(kind, source)` - map `T`'s identifier, get a token
//! - `dequeue(&token)` - a ready `T`, recycled when possible
//! - `recycle(&token, instance)` - hand a used instance back
//!
//! # Example
//!
//! ```ignore
//! use viewbus::reuse::{self, Reusable};
//! use viewbus::{ReuseKind, TemplateSource};
//!
//! #[derive(Default)]
//! struct CardTemplate { title: String }
//! impl Reusable for CardTemplate {}
//!
//! let token = reuse::register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class)?;
//! let card = reuse::dequeue(&token);
//! // ... configure and display, then hand it back:
//! reuse::recycle(&token, card);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::RegistryError;
use crate::reuse::pool;
use crate::types::{short_type_name, ReuseKind, TemplateSource};

// =============================================================================
// REUSABLE TRAIT
// =============================================================================

/// A view template that can be registered for reuse.
///
/// The reuse identifier defaults to the type's short name. Override it
/// when an external layout tool configured its own identifier - the
/// override must match what the tool wrote, a trust boundary this crate
/// documents but cannot check.
pub trait Reusable: Any {
    /// Identifier this type registers and dequeues under.
    fn reuse_identifier() -> Cow<'static, str>
    where
        Self: Sized,
    {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

// =============================================================================
// REUSE TOKEN
// =============================================================================

/// Opaque capability proving that `T` is registered.
///
/// Only [`register`] produces tokens, so holding one is proof the
/// identifier mapping exists; `dequeue` therefore has no error path.
/// The token carries no instance data - just the resolved identifier,
/// the kind, and a phantom type tag.
pub struct ReuseToken<T> {
    identifier: Cow<'static, str>,
    kind: ReuseKind,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ReuseToken<T> {
    /// The resolved identifier this token dequeues under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The kind namespace this token belongs to.
    pub fn kind(&self) -> ReuseKind {
        self.kind
    }
}

// Manual impls: the token is Clone regardless of whether T is.
impl<T> Clone for ReuseToken<T> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            kind: self.kind,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ReuseToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReuseToken")
            .field("identifier", &self.identifier)
            .field("kind", &self.kind)
            .field("type", &short_type_name::<T>())
            .finish()
    }
}

// =============================================================================
// REGISTER / DEQUEUE / RECYCLE
// =============================================================================

/// Register `T` under `kind` and receive its capability token.
///
/// Idempotent for the same type, kind, and source. Configuration mistakes
/// (identifier claimed by the other kind, unresolvable resource, missing
/// loader) fail loudly here, at setup, never at dequeue time.
pub fn register<T>(kind: ReuseKind, source: TemplateSource) -> Result<ReuseToken<T>, RegistryError>
where
    T: Reusable + Default,
{
    let identifier = T::reuse_identifier();

    let factory: pool::TemplateFactory = match &source {
        TemplateSource::Class => Rc::new(|| Box::new(T::default()) as Box<dyn Any>),
        TemplateSource::Resource(resource) => {
            let resource = resource.clone();
            Rc::new(move || {
                pool::load_resource(&resource).unwrap_or_else(|| {
                    panic!(
                        "resource template `{resource}` vanished after registration; \
                         the loader no longer resolves it"
                    )
                })
            })
        }
    };

    pool::register_template(identifier.as_ref(), kind, source, factory)?;
    log::debug!(
        "registry: {} registered as {kind:?} `{identifier}`",
        short_type_name::<T>()
    );

    Ok(ReuseToken {
        identifier,
        kind,
        _marker: PhantomData,
    })
}

/// Dequeue a ready instance of `T`.
///
/// Recycled instances are reused before fresh ones are built. The two
/// panics below are acknowledged escape hatches, not defended failure
/// modes: they fire only for a token that outlived a pool reset or whose
/// identifier was re-registered by a different type.
pub fn dequeue<T: Reusable>(token: &ReuseToken<T>) -> T {
    let instance = pool::dequeue_instance(token.identifier(), token.kind())
        .unwrap_or_else(|| {
            panic!(
                "no template registered for `{}` ({:?}); this token outlived \
                 the pool it was issued by",
                token.identifier(),
                token.kind()
            )
        });

    match instance.downcast::<T>() {
        Ok(instance) => *instance,
        Err(_) => panic!(
            "template `{}` no longer produces {} instances; its identifier \
             was re-registered with a different type",
            token.identifier(),
            short_type_name::<T>()
        ),
    }
}

/// Hand a used instance back for later reuse.
pub fn recycle<T: Reusable>(token: &ReuseToken<T>, instance: T) {
    pool::recycle_instance(token.identifier(), Box::new(instance));
}

/// Clear the registry's backing pool (for testing).
pub fn reset_registry_state() {
    pool::reset_pool_state();
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        let _ = env_logger::builder().is_test(true).try_init();
        reset_registry_state();
    }

    #[derive(Default, Debug, PartialEq)]
    struct CardTemplate {
        title: String,
    }
    impl Reusable for CardTemplate {}

    #[derive(Default, Debug, PartialEq)]
    struct SectionHeader {
        caption: String,
    }
    impl Reusable for SectionHeader {}

    #[derive(Default, Debug, PartialEq)]
    struct BannerView {
        image_name: String,
    }
    impl Reusable for BannerView {
        fn reuse_identifier() -> Cow<'static, str> {
            // Matches the identifier configured in the external layout tool.
            Cow::Borrowed("HeroBanner")
        }
    }

    #[test]
    fn test_dequeue_returns_exactly_the_registered_type() {
        setup();

        let token =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();
        assert_eq!(token.identifier(), "CardTemplate");
        assert_eq!(token.kind(), ReuseKind::Row);

        let card = dequeue(&token);
        assert_eq!(card, CardTemplate::default());
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        setup();

        let first =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();
        let second =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();

        assert_eq!(first.identifier(), second.identifier());
        assert_eq!(first.kind(), second.kind());
        assert_eq!(pool::template_count(), 1);

        // The second token behaves identically to the first.
        let _card = dequeue(&second);
        let _card = dequeue(&first);
    }

    #[test]
    fn test_same_identifier_under_other_kind_is_a_configuration_error() {
        setup();

        #[derive(Default)]
        struct Clashing;
        impl Reusable for Clashing {
            fn reuse_identifier() -> Cow<'static, str> {
                Cow::Borrowed("CardTemplate")
            }
        }

        let _token =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();

        let err = register::<Clashing>(ReuseKind::HeaderFooter, TemplateSource::Class)
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateKindMismatch {
                identifier: "CardTemplate".to_string(),
                existing: ReuseKind::Row,
                requested: ReuseKind::HeaderFooter,
            }
        );

        // The failed registration must not disturb the existing entry.
        assert_eq!(pool::registered_kind("CardTemplate"), Some(ReuseKind::Row));
    }

    #[test]
    fn test_kinds_do_not_collide_for_distinct_identifiers() {
        setup();

        let row = register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();
        let header =
            register::<SectionHeader>(ReuseKind::HeaderFooter, TemplateSource::Class).unwrap();

        let _card: CardTemplate = dequeue(&row);
        let _head: SectionHeader = dequeue(&header);
    }

    #[test]
    fn test_recycled_instance_comes_back_on_dequeue() {
        setup();

        let token =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();

        let mut card = dequeue(&token);
        card.title = "configured".to_string();
        recycle(&token, card);

        let card = dequeue(&token);
        assert_eq!(card.title, "configured");

        // Free list is drained, so the next dequeue is a fresh build.
        let card = dequeue(&token);
        assert_eq!(card, CardTemplate::default());
    }

    #[test]
    fn test_resource_template_resolves_through_the_loader() {
        setup();

        pool::set_resource_loader(|name| {
            (name == "hero_banner").then(|| {
                Box::new(BannerView {
                    image_name: "from-bundle".to_string(),
                }) as Box<dyn Any>
            })
        });

        let token = register::<BannerView>(
            ReuseKind::HeaderFooter,
            TemplateSource::Resource("hero_banner".to_string()),
        )
        .unwrap();
        assert_eq!(token.identifier(), "HeroBanner");

        let banner = dequeue(&token);
        assert_eq!(banner.image_name, "from-bundle");
    }

    #[test]
    fn test_resource_template_without_loader_fails_at_setup() {
        setup();

        let err = register::<BannerView>(
            ReuseKind::HeaderFooter,
            TemplateSource::Resource("hero_banner".to_string()),
        )
        .unwrap_err();

        assert_eq!(
            err,
            RegistryError::NoResourceLoader {
                identifier: "HeroBanner".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_resource_fails_at_setup() {
        setup();

        pool::set_resource_loader(|_| None);

        let err = register::<BannerView>(
            ReuseKind::HeaderFooter,
            TemplateSource::Resource("hero_banner".to_string()),
        )
        .unwrap_err();

        assert_eq!(
            err,
            RegistryError::MissingResource {
                identifier: "HeroBanner".to_string(),
                resource: "hero_banner".to_string(),
            }
        );
    }

    #[test]
    #[should_panic(expected = "outlived")]
    fn test_stale_token_after_reset_panics_with_a_diagnostic() {
        setup();

        let token =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();
        reset_registry_state();

        let _card = dequeue(&token);
    }

    #[test]
    fn test_token_is_clone_and_debug() {
        setup();

        let token =
            register::<CardTemplate>(ReuseKind::Row, TemplateSource::Class).unwrap();
        let copy = token.clone();
        let _card = dequeue(&copy);

        let rendered = format!("{token:?}");
        assert!(rendered.contains("CardTemplate"));
        assert!(rendered.contains("Row"));
    }
}
