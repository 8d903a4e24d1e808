//! Post-activation decorators.

use std::any::TypeId;
use std::sync::Arc;

use crate::context::ActivationContext;
use crate::descriptor::AnyHandle;
use crate::error::{ResolveError, ResolveResult};
use crate::key::ServiceKey;

type MatchFn = Box<dyn Fn(&ServiceKey) -> bool + Send + Sync>;
type WrapFn = Box<
    dyn for<'a> Fn(AnyHandle, &ActivationContext<'a>) -> ResolveResult<AnyHandle> + Send + Sync,
>;

/// A (predicate, wrapping-closure) pair applied after activation.
///
/// The predicate decides whether a service key is decorated; the wrapper
/// receives the already-built inner instance and produces the decorated one.
/// Multiple decorators for one key compose in registration order, with the
/// decorator registered last ending up outermost. The decorated instance is
/// what gets cached and enrolled for release.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
/// use std::sync::Arc;
///
/// trait Notifier: Send + Sync {
///     fn notify(&self) -> String;
/// }
///
/// struct Email;
/// impl Notifier for Email {
///     fn notify(&self) -> String {
///         "email".to_string()
///     }
/// }
///
/// struct Retrying {
///     inner: Arc<dyn Notifier>,
/// }
/// impl Notifier for Retrying {
///     fn notify(&self) -> String {
///         format!("retry({})", self.inner.notify())
///     }
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_transient_trait_factory::<dyn Notifier, _>(|_| Ok(Arc::new(Email)));
/// builder.decorate_trait::<dyn Notifier, _>(|inner, _ctx| Ok(Arc::new(Retrying { inner })));
///
/// let root = builder.build();
/// let notifier = root.get_trait::<dyn Notifier>().unwrap();
/// assert_eq!(notifier.notify(), "retry(email)");
/// ```
pub struct Decorator {
    matches: MatchFn,
    wrap: WrapFn,
}

impl Decorator {
    /// Builds a decorator from a raw predicate and type-erased wrapper.
    pub fn new(
        matches: impl Fn(&ServiceKey) -> bool + Send + Sync + 'static,
        wrap: impl for<'a> Fn(AnyHandle, &ActivationContext<'a>) -> ResolveResult<AnyHandle>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            matches: Box::new(matches),
            wrap: Box::new(wrap),
        }
    }

    /// Typed decorator over a concrete component type, matching every single
    /// (plain or qualified) key of that type.
    pub fn for_type<T, F>(wrap: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(Arc<T>, &ActivationContext<'a>) -> ResolveResult<Arc<T>>
            + Send
            + Sync
            + 'static,
    {
        let target = TypeId::of::<T>();
        Self::new(
            move |key| key.is_single() && key.type_id() == target,
            move |value, ctx| {
                let inner = value
                    .downcast::<T>()
                    .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))?;
                let wrapped: AnyHandle = wrap(inner, ctx)?;
                Ok(wrapped)
            },
        )
    }

    /// Typed decorator over a trait object, matching every single key of the
    /// trait.
    pub fn for_trait<T, F>(wrap: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(Arc<T>, &ActivationContext<'a>) -> ResolveResult<Arc<T>>
            + Send
            + Sync
            + 'static,
    {
        let target = TypeId::of::<T>();
        Self::new(
            move |key| key.is_single() && key.type_id() == target,
            move |value, ctx| {
                let inner = value
                    .downcast::<Arc<T>>()
                    .map(|boxed| (*boxed).clone())
                    .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))?;
                let wrapped: AnyHandle = Arc::new(wrap(inner, ctx)?);
                Ok(wrapped)
            },
        )
    }

    pub(crate) fn applies_to(&self, key: &ServiceKey) -> bool {
        (self.matches)(key)
    }

    pub(crate) fn apply(
        &self,
        value: AnyHandle,
        ctx: &ActivationContext<'_>,
    ) -> ResolveResult<AnyHandle> {
        (self.wrap)(value, ctx)
    }
}
