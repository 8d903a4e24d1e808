//! Registration sources: on-demand descriptor synthesis.
//!
//! Sources supply descriptors for keys with no static registration. The
//! built-in sources cover sequence aggregation, qualifier groups and
//! deferred accessors; [`TemplateSource`] lets callers realize closed
//! descriptors from parametric templates on first concrete request.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::activator::Activator;
use crate::context::ActivationContext;
use crate::descriptor::{AnyHandle, ComponentDescriptor};
use crate::error::{ResolveError, ResolveResult};
use crate::key::ServiceKey;
use crate::registry::ComponentRegistry;
use crate::scope::LifetimeScope;
use crate::sharing::Sharing;
use crate::traits::ResolverCore;

/// Synthesizes descriptors on demand for keys with no static registration.
///
/// Sources are queried in precedence order after static lookup fails; the
/// first non-empty synthesis is cached by the registry, so a source is asked
/// at most once per key per registry. A source may call back into the
/// registry it is given, e.g. to aggregate the registrations of an element
/// type.
pub trait RegistrationSource: Send + Sync {
    /// Cheap pre-check: can this source supply the key at all?
    fn can_supply(&self, key: &ServiceKey) -> bool;

    /// Yields zero or more descriptors satisfying the key.
    fn synthesize(
        &self,
        key: &ServiceKey,
        registry: &ComponentRegistry,
    ) -> Vec<Arc<ComponentDescriptor>>;
}

/// Aggregates every registration of an element type into one transient
/// descriptor producing the elements in registration order.
pub(crate) struct SequenceSource;

impl RegistrationSource for SequenceSource {
    fn can_supply(&self, key: &ServiceKey) -> bool {
        matches!(key, ServiceKey::Sequence(_, _))
    }

    fn synthesize(
        &self,
        key: &ServiceKey,
        registry: &ComponentRegistry,
    ) -> Vec<Arc<ComponentDescriptor>> {
        let element = match key.element() {
            Some(element) if matches!(key, ServiceKey::Sequence(_, _)) => element,
            _ => return Vec::new(),
        };
        let members = registry.registered(&element);
        let activator = Activator::raw(Arc::new(move |ctx: &ActivationContext<'_>| {
            let mut items: Vec<AnyHandle> = Vec::with_capacity(members.len());
            for member in &members {
                items.push(ctx.resolve_descriptor(&element, member)?);
            }
            let handle: AnyHandle = Arc::new(items);
            Ok(handle)
        }));
        let descriptor =
            ComponentDescriptor::new(vec![key.clone()], activator, Sharing::Transient)
                .externally_owned();
        vec![Arc::new(descriptor)]
    }
}

/// Aggregates the qualified registrations of an element type into one
/// transient descriptor producing `(qualifier, instance)` pairs.
pub(crate) struct GroupSource;

impl RegistrationSource for GroupSource {
    fn can_supply(&self, key: &ServiceKey) -> bool {
        matches!(key, ServiceKey::Group(_, _))
    }

    fn synthesize(
        &self,
        key: &ServiceKey,
        registry: &ComponentRegistry,
    ) -> Vec<Arc<ComponentDescriptor>> {
        let (element, name) = match key {
            ServiceKey::Group(element, name) => (*element, *name),
            _ => return Vec::new(),
        };
        let members = registry.qualified_registrations(element);
        let activator = Activator::raw(Arc::new(move |ctx: &ActivationContext<'_>| {
            let mut items: Vec<(&'static str, AnyHandle)> = Vec::with_capacity(members.len());
            for (qualifier, member) in &members {
                let member_key = ServiceKey::Qualified(element, name, *qualifier);
                items.push((*qualifier, ctx.resolve_descriptor(&member_key, member)?));
            }
            let handle: AnyHandle = Arc::new(items);
            Ok(handle)
        }));
        let descriptor =
            ComponentDescriptor::new(vec![key.clone()], activator, Sharing::Transient)
                .externally_owned();
        vec![Arc::new(descriptor)]
    }
}

/// Wraps a registered inner key behind a lazily-invoked accessor.
///
/// The synthesized descriptor captures the requesting scope weakly; invoking
/// the accessor later starts a fresh resolve operation, which is the
/// sanctioned re-entrant escape hatch for breaking construction-time cycles.
pub(crate) struct DeferredSource;

impl RegistrationSource for DeferredSource {
    fn can_supply(&self, key: &ServiceKey) -> bool {
        matches!(key, ServiceKey::Deferred(_, _, _))
    }

    fn synthesize(
        &self,
        key: &ServiceKey,
        registry: &ComponentRegistry,
    ) -> Vec<Arc<ComponentDescriptor>> {
        let inner = match key.element() {
            Some(inner) if matches!(key, ServiceKey::Deferred(_, _, _)) => inner,
            _ => return Vec::new(),
        };
        if registry.candidates(&inner).is_empty() {
            return Vec::new();
        }
        let activator = Activator::raw(Arc::new(move |ctx: &ActivationContext<'_>| {
            let handle: AnyHandle = Arc::new(DeferredHandle {
                scope: Arc::downgrade(ctx.scope()),
                key: inner.clone(),
            });
            Ok(handle)
        }));
        let descriptor =
            ComponentDescriptor::new(vec![key.clone()], activator, Sharing::Transient)
                .externally_owned();
        vec![Arc::new(descriptor)]
    }
}

/// Type-erased deferred accessor: the scope it was created in plus the key
/// it will resolve.
pub struct DeferredHandle {
    scope: Weak<LifetimeScope>,
    key: ServiceKey,
}

impl DeferredHandle {
    /// The key the accessor resolves on invocation.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    fn resolve(&self) -> ResolveResult<AnyHandle> {
        let scope = self.scope.upgrade().ok_or(ResolveError::ScopeReleased)?;
        scope.resolve_key(&self.key)
    }
}

/// Typed deferred accessor for a component of type `T`.
///
/// Obtained through [`Resolver::get_deferred`](crate::Resolver::get_deferred).
/// The inner component is resolved on first demand, against the scope the
/// accessor was created in.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
///
/// struct Expensive { answer: u32 }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_root_factory::<Expensive, _>(|_| Ok(Expensive { answer: 42 }));
///
/// let root = builder.build();
/// let deferred = root.get_deferred::<Expensive>().unwrap();
/// // Nothing has been constructed yet; `get` triggers activation.
/// assert_eq!(deferred.get().unwrap().answer, 42);
/// ```
pub struct Deferred<T: Send + Sync + 'static> {
    handle: Arc<DeferredHandle>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Deferred<T> {
    pub(crate) fn new(handle: Arc<DeferredHandle>) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// Resolves the inner component, activating it if necessary.
    pub fn get(&self) -> ResolveResult<Arc<T>> {
        self.handle
            .resolve()?
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
    }
}

impl<T: Send + Sync + 'static> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

/// One parametric registration template: a match predicate over concrete
/// keys plus a realize function producing the closed descriptor.
pub struct DescriptorTemplate {
    matches: Box<dyn Fn(&ServiceKey) -> bool + Send + Sync>,
    realize: Box<
        dyn Fn(&ServiceKey, &ComponentRegistry) -> Option<ComponentDescriptor> + Send + Sync,
    >,
}

impl DescriptorTemplate {
    /// Builds a template from a predicate and a realize function.
    pub fn new(
        matches: impl Fn(&ServiceKey) -> bool + Send + Sync + 'static,
        realize: impl Fn(&ServiceKey, &ComponentRegistry) -> Option<ComponentDescriptor>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            matches: Box::new(matches),
            realize: Box::new(realize),
        }
    }
}

/// Registration source holding descriptor templates.
///
/// A concrete descriptor is realized from the first matching template on the
/// first request for a concrete key and cached by that key, so repeated
/// requests observe the identical descriptor (and therefore the identical
/// shared instance).
///
/// # Examples
///
/// ```rust
/// use wrought_di::{
///     Activator, ComponentDescriptor, DescriptorTemplate, RegistryBuilder, Resolver,
///     ServiceKey, Sharing, TemplateSource,
/// };
///
/// struct Audit { subject: &'static str }
///
/// let template = DescriptorTemplate::new(
///     |key| key.qualifier().is_some() && key.type_id() == std::any::TypeId::of::<Audit>(),
///     |key, _registry| {
///         let subject = key.qualifier()?;
///         Some(ComponentDescriptor::new(
///             vec![key.clone()],
///             Activator::factory::<Audit, _>(move |_| Ok(Audit { subject })),
///             Sharing::Root,
///         ))
///     },
/// );
///
/// let mut builder = RegistryBuilder::new();
/// builder.register_source(TemplateSource::new().with_template(template));
///
/// let root = builder.build();
/// let audit = root.get_qualified::<Audit>("billing").unwrap();
/// assert_eq!(audit.subject, "billing");
/// ```
pub struct TemplateSource {
    templates: Vec<DescriptorTemplate>,
    realized: RwLock<HashMap<ServiceKey, Arc<ComponentDescriptor>>>,
}

impl TemplateSource {
    /// Empty template source.
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            realized: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a template, builder-style.
    pub fn with_template(mut self, template: DescriptorTemplate) -> Self {
        self.templates.push(template);
        self
    }
}

impl Default for TemplateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationSource for TemplateSource {
    fn can_supply(&self, key: &ServiceKey) -> bool {
        self.templates.iter().any(|template| (template.matches)(key))
    }

    fn synthesize(
        &self,
        key: &ServiceKey,
        registry: &ComponentRegistry,
    ) -> Vec<Arc<ComponentDescriptor>> {
        if let Some(existing) = self.realized.read().get(key) {
            return vec![existing.clone()];
        }
        for template in &self.templates {
            if !(template.matches)(key) {
                continue;
            }
            let Some(descriptor) = (template.realize)(key, registry) else {
                continue;
            };
            let mut cache = self.realized.write();
            let entry = cache
                .entry(key.clone())
                .or_insert_with(|| Arc::new(descriptor));
            return vec![entry.clone()];
        }
        Vec::new()
    }
}
