//! Resolution surfaces: the object-level core and the typed sugar.

use std::sync::Arc;

use crate::descriptor::AnyHandle;
use crate::error::{ResolveError, ResolveResult};
use crate::key::ServiceKey;
use crate::sources::{Deferred, DeferredHandle};

/// Object-level resolution surface.
///
/// Implemented by [`LifetimeScope`](crate::LifetimeScope) (each call starts a
/// fresh resolve operation) and by
/// [`ActivationContext`](crate::ActivationContext) (calls join the in-flight
/// operation, sharing its cycle-detection stack). Most callers use the typed
/// [`Resolver`] methods layered on top.
pub trait ResolverCore {
    /// Resolves a key to a type-erased instance handle.
    fn resolve_key(&self, key: &ServiceKey) -> ResolveResult<AnyHandle>;
}

/// Typed resolution sugar over [`ResolverCore`].
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
/// use std::sync::Arc;
///
/// trait Transport: Send + Sync {
///     fn name(&self) -> &'static str;
/// }
///
/// struct Tcp;
/// impl Transport for Tcp {
///     fn name(&self) -> &'static str {
///         "tcp"
///     }
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_root_instance(8080u16);
/// builder.add_root_trait_instance::<dyn Transport>(Arc::new(Tcp));
///
/// let root = builder.build();
/// assert_eq!(*root.get::<u16>().unwrap(), 8080);
/// assert_eq!(root.get_trait::<dyn Transport>().unwrap().name(), "tcp");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete component type.
    fn get<T: Send + Sync + 'static>(&self) -> ResolveResult<Arc<T>> {
        let handle = self.resolve_key(&ServiceKey::of::<T>())?;
        handle
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a trait-object component.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> ResolveResult<Arc<T>> {
        let handle = self.resolve_key(&ServiceKey::of::<T>())?;
        handle
            .downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a qualified concrete component.
    fn get_qualified<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> ResolveResult<Arc<T>> {
        let handle = self.resolve_key(&ServiceKey::qualified::<T>(name))?;
        handle
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a qualified trait-object component.
    fn get_qualified_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> ResolveResult<Arc<T>> {
        let handle = self.resolve_key(&ServiceKey::qualified::<T>(name))?;
        handle
            .downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves every registration of a concrete element type, in
    /// registration order. Zero registrations yield an empty vector.
    fn get_sequence<T: Send + Sync + 'static>(&self) -> ResolveResult<Vec<Arc<T>>> {
        let handle = self.resolve_key(&ServiceKey::sequence_of::<T>())?;
        let items = handle
            .downcast::<Vec<AnyHandle>>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))?;
        items
            .iter()
            .map(|item| {
                item.clone()
                    .downcast::<T>()
                    .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
            })
            .collect()
    }

    /// Resolves every registration of a trait-object element type, in
    /// registration order.
    fn get_trait_sequence<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> ResolveResult<Vec<Arc<T>>> {
        let handle = self.resolve_key(&ServiceKey::sequence_of::<T>())?;
        let items = handle
            .downcast::<Vec<AnyHandle>>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))?;
        items
            .iter()
            .map(|item| {
                item.clone()
                    .downcast::<Arc<T>>()
                    .map(|boxed| (*boxed).clone())
                    .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
            })
            .collect()
    }

    /// Resolves the qualified registrations of a concrete element type as
    /// `(qualifier, instance)` pairs, in registration order.
    fn get_group<T: Send + Sync + 'static>(
        &self,
    ) -> ResolveResult<Vec<(&'static str, Arc<T>)>> {
        let handle = self.resolve_key(&ServiceKey::group_of::<T>())?;
        let items = handle
            .downcast::<Vec<(&'static str, AnyHandle)>>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))?;
        items
            .iter()
            .map(|(qualifier, item)| {
                item.clone()
                    .downcast::<T>()
                    .map(|value| (*qualifier, value))
                    .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
            })
            .collect()
    }

    /// Resolves a deferred accessor for a concrete component.
    ///
    /// The inner component is not constructed until
    /// [`Deferred::get`](crate::Deferred::get) runs, which starts a fresh
    /// resolve operation; this is the sanctioned way to break a
    /// construction-time cycle.
    fn get_deferred<T: Send + Sync + 'static>(&self) -> ResolveResult<Deferred<T>> {
        let handle = self.resolve_key(&ServiceKey::deferred_of::<T>())?;
        let inner = handle
            .downcast::<DeferredHandle>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))?;
        Ok(Deferred::new(inner))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
