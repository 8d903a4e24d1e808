//! Activation context handed to factories, constructors and decorators.

use std::sync::Arc;

use crate::activator::Parameters;
use crate::descriptor::{AnyHandle, ComponentDescriptor};
use crate::error::ResolveResult;
use crate::key::ServiceKey;
use crate::operation::ResolveOperation;
use crate::pipeline;
use crate::scope::LifetimeScope;
use crate::traits::ResolverCore;

/// Context passed to activators while an instance is being produced.
///
/// The context ties the activator to the scope of the original request and
/// to the in-flight [`ResolveOperation`], so dependency resolves share the
/// top-level request's cycle-detection stack. The typed resolution surface
/// comes from the blanket [`Resolver`](crate::Resolver) implementation.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_root_instance(Database { url: "postgres://localhost".to_string() });
/// builder.add_transient_factory::<Repository, _>(|ctx| {
///     Ok(Repository { db: ctx.get::<Database>()? })
/// });
///
/// let root = builder.build();
/// let repo = root.get::<Repository>().unwrap();
/// assert_eq!(repo.db.url, "postgres://localhost");
/// ```
pub struct ActivationContext<'a> {
    scope: &'a Arc<LifetimeScope>,
    operation: &'a ResolveOperation,
    parameters: &'a Parameters,
}

impl<'a> ActivationContext<'a> {
    pub(crate) fn new(
        scope: &'a Arc<LifetimeScope>,
        operation: &'a ResolveOperation,
        parameters: &'a Parameters,
    ) -> Self {
        Self {
            scope,
            operation,
            parameters,
        }
    }

    /// The scope the original request was issued against.
    pub fn scope(&self) -> &Arc<LifetimeScope> {
        self.scope
    }

    /// Explicit parameter of type `T` supplied with the request, if any.
    pub fn parameter<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let handle = self.parameters.lookup(&ServiceKey::of::<T>())?;
        handle.downcast::<T>().ok()
    }

    /// Explicit qualified parameter of type `T`, if any.
    pub fn qualified_parameter<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Option<Arc<T>> {
        let handle = self.parameters.lookup(&ServiceKey::qualified::<T>(name))?;
        handle.downcast::<T>().ok()
    }

    /// Whether a constructor parameter key can be bound: by an explicit
    /// parameter, a registration, a synthesizable descriptor, or a
    /// collection shape (always bindable, possibly empty).
    pub(crate) fn is_satisfiable(&self, key: &ServiceKey) -> bool {
        if self.parameters.lookup(key).is_some() {
            return true;
        }
        if key.is_collection() {
            return true;
        }
        !self.scope.registry().candidates(key).is_empty()
    }

    /// Binds one constructor parameter: explicit parameters first, then the
    /// regular pipeline.
    pub(crate) fn resolve_dependency(&self, key: &ServiceKey) -> ResolveResult<AnyHandle> {
        if let Some(value) = self.parameters.lookup(key) {
            return Ok(value);
        }
        self.resolve_key(key)
    }

    /// Runs a specific descriptor through the pipeline under this context's
    /// operation. Used by aggregate registration sources.
    pub(crate) fn resolve_descriptor(
        &self,
        key: &ServiceKey,
        descriptor: &Arc<ComponentDescriptor>,
    ) -> ResolveResult<AnyHandle> {
        let empty = Parameters::default();
        pipeline::resolve_descriptor(self.scope, key, descriptor, &empty, self.operation)
    }
}

impl ResolverCore for ActivationContext<'_> {
    fn resolve_key(&self, key: &ServiceKey) -> ResolveResult<AnyHandle> {
        // Dependency resolves never inherit the request's explicit parameters.
        let empty = Parameters::default();
        pipeline::resolve_key(self.scope, key, &empty, self.operation)
    }
}
