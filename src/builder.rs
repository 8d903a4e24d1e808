//! The composition-time registration surface.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::activator::{Activator, ConstructorCandidate};
use crate::context::ActivationContext;
use crate::decorator::Decorator;
use crate::descriptor::{release_hook, release_hook_trait, ComponentDescriptor, ReleaseHook};
use crate::error::ResolveResult;
use crate::key::ServiceKey;
use crate::module::RegistrationModule;
use crate::observer::{Observers, ResolveObserver};
use crate::registry::{ComponentRegistry, ResolveOptions};
use crate::scope::LifetimeScope;
use crate::sharing::{Ownership, Sharing};
use crate::sources::{DeferredSource, GroupSource, RegistrationSource, SequenceSource};
use crate::traits::Releasable;

/// Collects component descriptors, registration sources, decorators and
/// observers, then seals them into an immutable registry whose root
/// [`LifetimeScope`] is returned by [`build`](RegistryBuilder::build).
///
/// Registrations are immutable after `build`; later registrations for the
/// same key take single-result precedence, while sequence and group lookups
/// see all of them in registration order.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Client { config: Arc<Config> }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_root_instance(Config { url: "https://example.com".to_string() });
/// builder.add_transient_factory::<Client, _>(|ctx| {
///     Ok(Client { config: ctx.get::<Config>()? })
/// });
///
/// let root = builder.build();
/// let client = root.get::<Client>().unwrap();
/// assert_eq!(client.config.url, "https://example.com");
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    descriptors: Vec<ComponentDescriptor>,
    sources: Vec<Arc<dyn RegistrationSource>>,
    decorators: Vec<Decorator>,
    observers: Observers,
    options: ResolveOptions,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a finished descriptor.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Registers a dynamic registration source.
    ///
    /// User sources are queried before the built-in sequence, group and
    /// deferred sources.
    pub fn register_source<S: RegistrationSource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Registers a decorator.
    pub fn decorate(&mut self, decorator: Decorator) -> &mut Self {
        self.decorators.push(decorator);
        self
    }

    /// Registers a typed decorator over a concrete component type.
    pub fn decorate_type<T, F>(&mut self, wrap: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(Arc<T>, &ActivationContext<'a>) -> ResolveResult<Arc<T>>
            + Send
            + Sync
            + 'static,
    {
        self.decorate(Decorator::for_type::<T, F>(wrap))
    }

    /// Registers a typed decorator over a trait object.
    pub fn decorate_trait<T, F>(&mut self, wrap: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(Arc<T>, &ActivationContext<'a>) -> ResolveResult<Arc<T>>
            + Send
            + Sync
            + 'static,
    {
        self.decorate(Decorator::for_trait::<T, F>(wrap))
    }

    /// Registers a diagnostic observer.
    pub fn observe(&mut self, observer: Arc<dyn ResolveObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Overrides the maximum resolve stack depth.
    pub fn with_max_resolve_depth(&mut self, depth: usize) -> &mut Self {
        self.options.max_depth = depth;
        self
    }

    /// Applies a registration module.
    pub fn add_module<M: RegistrationModule>(&mut self, module: M) -> ResolveResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }

    // ----- Concrete type registrations -----

    /// Registers a pre-built value shared across the whole scope tree.
    pub fn add_root_instance<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.register(ComponentDescriptor::new(
            vec![ServiceKey::of::<T>()],
            Activator::instance(value),
            Sharing::Root,
        ))
    }

    /// Registers a factory producing one instance for the whole scope tree,
    /// created on first request.
    pub fn add_root_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<T> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Sharing::Root, factory)
    }

    /// Registers a factory producing one instance per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<T> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Sharing::Scoped, factory)
    }

    /// Registers a factory producing a fresh instance on every resolution.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<T> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Sharing::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, sharing: Sharing, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<T> + Send + Sync + 'static,
    {
        self.register(ComponentDescriptor::new(
            vec![ServiceKey::of::<T>()],
            Activator::factory(factory),
            sharing,
        ))
    }

    // ----- Trait-object registrations -----

    /// Registers a pre-built trait object shared across the whole tree.
    pub fn add_root_trait_instance<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(ComponentDescriptor::new(
            vec![ServiceKey::of::<T>()],
            Activator::trait_instance(value),
            Sharing::Root,
        ))
    }

    /// Registers a trait-object factory shared across the whole tree.
    pub fn add_root_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add_trait_factory::<T, F>(Sharing::Root, factory)
    }

    /// Registers a trait-object factory producing one instance per scope.
    pub fn add_scoped_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add_trait_factory::<T, F>(Sharing::Scoped, factory)
    }

    /// Registers a trait-object factory producing a fresh instance per
    /// resolution.
    pub fn add_transient_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add_trait_factory::<T, F>(Sharing::Transient, factory)
    }

    fn add_trait_factory<T, F>(&mut self, sharing: Sharing, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.register(ComponentDescriptor::new(
            vec![ServiceKey::of::<T>()],
            Activator::arc_factory(factory),
            sharing,
        ))
    }

    // ----- Fluent per-component configuration -----

    /// Starts a fluent registration for a concrete component type.
    pub fn component<T: Send + Sync + 'static>(&mut self) -> ComponentBuilder<'_, T> {
        ComponentBuilder {
            builder: self,
            keys: vec![ServiceKey::of::<T>()],
            sharing: Sharing::Transient,
            ownership: Ownership::Owned,
            activator: None,
            constructors: Vec::new(),
            release: None,
            _marker: PhantomData,
        }
    }

    /// Starts a fluent registration for a trait object.
    pub fn trait_component<T: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> TraitComponentBuilder<'_, T> {
        TraitComponentBuilder {
            builder: self,
            keys: vec![ServiceKey::of::<T>()],
            sharing: Sharing::Transient,
            ownership: Ownership::Owned,
            activator: None,
            release: None,
            _marker: PhantomData,
        }
    }

    /// Seals the registrations and returns the root scope.
    pub fn build(self) -> Arc<LifetimeScope> {
        let mut sources = self.sources;
        sources.push(Arc::new(SequenceSource));
        sources.push(Arc::new(GroupSource));
        sources.push(Arc::new(DeferredSource));
        let registry = ComponentRegistry::build(
            self.descriptors,
            sources,
            self.decorators,
            self.observers,
            self.options,
        );
        LifetimeScope::root(registry)
    }

    /// Seals a scope-local registration delta on top of a parent registry.
    /// Observers and options stay with the root.
    pub(crate) fn build_overlay(self, parent: Arc<ComponentRegistry>) -> Arc<ComponentRegistry> {
        ComponentRegistry::overlay(parent, self.descriptors, self.sources, self.decorators)
    }
}

/// Fluent registration of one concrete component.
///
/// Finish with [`register`](ComponentBuilder::register); registering without
/// an activator is a composition error and panics.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Releasable, Resolver, Sharing};
///
/// struct Buffer;
///
/// impl Releasable for Buffer {
///     fn release(&self) {}
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder
///     .component::<Buffer>()
///     .sharing(Sharing::Scoped)
///     .factory(|_| Ok(Buffer))
///     .releasable()
///     .register();
///
/// let root = builder.build();
/// let scope = root.begin_scope().unwrap();
/// assert!(scope.get::<Buffer>().is_ok());
/// ```
pub struct ComponentBuilder<'a, T: Send + Sync + 'static> {
    builder: &'a mut RegistryBuilder,
    keys: Vec<ServiceKey>,
    sharing: Sharing,
    ownership: Ownership,
    activator: Option<Activator>,
    constructors: Vec<ConstructorCandidate>,
    release: Option<ReleaseHook>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> ComponentBuilder<'a, T> {
    /// Replaces the default key with a qualified one.
    pub fn qualified(mut self, name: &'static str) -> Self {
        self.keys = vec![ServiceKey::qualified::<T>(name)];
        self
    }

    /// Adds an extra qualified key alongside the existing keys.
    pub fn also_qualified(mut self, name: &'static str) -> Self {
        self.keys.push(ServiceKey::qualified::<T>(name));
        self
    }

    /// Sets the sharing mode (transient by default).
    pub fn sharing(mut self, sharing: Sharing) -> Self {
        self.sharing = sharing;
        self
    }

    /// Opts instances out of disposal enrollment.
    pub fn externally_owned(mut self) -> Self {
        self.ownership = Ownership::External;
        self
    }

    /// Enrolls owned instances for release during scope teardown.
    pub fn releasable(mut self) -> Self
    where
        T: Releasable,
    {
        self.release = Some(release_hook::<T>());
        self
    }

    /// Uses an explicit factory.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: for<'b> Fn(&ActivationContext<'b>) -> ResolveResult<T> + Send + Sync + 'static,
    {
        self.activator = Some(Activator::factory(factory));
        self
    }

    /// Uses a single-use provided instance.
    pub fn instance(mut self, value: T) -> Self {
        self.activator = Some(Activator::instance(value));
        self
    }

    /// Adds a constructor candidate; call repeatedly to offer alternatives.
    pub fn constructor(mut self, candidate: ConstructorCandidate) -> Self {
        self.constructors.push(candidate);
        self
    }

    /// Finishes the registration.
    ///
    /// # Panics
    ///
    /// Panics if neither a factory, an instance nor a constructor candidate
    /// was supplied.
    pub fn register(self) -> &'a mut RegistryBuilder {
        let activator = match (self.activator, self.constructors) {
            (Some(activator), _) => activator,
            (None, constructors) if !constructors.is_empty() => {
                Activator::constructors(constructors)
            }
            _ => panic!(
                "component registration for {} has no activator",
                std::any::type_name::<T>()
            ),
        };
        let mut descriptor = ComponentDescriptor::new(self.keys, activator, self.sharing);
        if self.ownership == Ownership::External {
            descriptor = descriptor.externally_owned();
        }
        if let Some(hook) = self.release {
            descriptor = descriptor.with_release_hook(hook);
        }
        self.builder.register(descriptor);
        self.builder
    }
}

/// Fluent registration of one trait-object component.
pub struct TraitComponentBuilder<'a, T: ?Sized + Send + Sync + 'static> {
    builder: &'a mut RegistryBuilder,
    keys: Vec<ServiceKey>,
    sharing: Sharing,
    ownership: Ownership,
    activator: Option<Activator>,
    release: Option<ReleaseHook>,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<'a, T: ?Sized + Send + Sync + 'static> TraitComponentBuilder<'a, T> {
    /// Replaces the default key with a qualified one.
    pub fn qualified(mut self, name: &'static str) -> Self {
        self.keys = vec![ServiceKey::qualified::<T>(name)];
        self
    }

    /// Sets the sharing mode (transient by default).
    pub fn sharing(mut self, sharing: Sharing) -> Self {
        self.sharing = sharing;
        self
    }

    /// Opts instances out of disposal enrollment.
    pub fn externally_owned(mut self) -> Self {
        self.ownership = Ownership::External;
        self
    }

    /// Enrolls owned instances for release during scope teardown.
    pub fn releasable(mut self) -> Self
    where
        T: Releasable,
    {
        self.release = Some(release_hook_trait::<T>());
        self
    }

    /// Uses an explicit factory returning the trait object.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: for<'b> Fn(&ActivationContext<'b>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.activator = Some(Activator::arc_factory(factory));
        self
    }

    /// Uses a single-use provided instance.
    pub fn instance(mut self, value: Arc<T>) -> Self {
        self.activator = Some(Activator::trait_instance(value));
        self
    }

    /// Finishes the registration.
    ///
    /// # Panics
    ///
    /// Panics if neither a factory nor an instance was supplied.
    pub fn register(self) -> &'a mut RegistryBuilder {
        let activator = self.activator.unwrap_or_else(|| {
            panic!(
                "component registration for {} has no activator",
                std::any::type_name::<T>()
            )
        });
        let mut descriptor = ComponentDescriptor::new(self.keys, activator, self.sharing);
        if self.ownership == Ownership::External {
            descriptor = descriptor.externally_owned();
        }
        if let Some(hook) = self.release {
            descriptor = descriptor.with_release_hook(hook);
        }
        self.builder.register(descriptor);
        self.builder
    }
}
