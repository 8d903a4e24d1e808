//! Activators: the instance-producing half of a descriptor.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::ActivationContext;
use crate::descriptor::AnyHandle;
use crate::error::{ResolveError, ResolveResult};
use crate::key::ServiceKey;

pub(crate) type FactoryFn =
    Arc<dyn for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<AnyHandle> + Send + Sync>;

/// Produces one raw instance for a descriptor.
///
/// Three variants:
///
/// - **Explicit factory**: a caller-supplied function receiving an
///   [`ActivationContext`] through which it resolves its own dependencies.
/// - **Constructor-selecting**: a set of [`ConstructorCandidate`]s with
///   explicit parameter bindings; the candidate with the most satisfiable
///   parameters wins, ties broken by declaration order.
/// - **Provided instance**: wraps a fixed, pre-built value; single-use.
///
/// Dependencies requested during activation flow through the same resolve
/// pipeline, evaluated in the scope of the original request.
pub struct Activator {
    kind: ActivatorKind,
}

enum ActivatorKind {
    Factory(FactoryFn),
    Constructors(Vec<ConstructorCandidate>),
    Instance(ProvidedInstance),
}

impl Activator {
    /// Factory activator for a concrete type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wrought_di::{Activator, Resolver};
    ///
    /// struct Greeter { greeting: String }
    ///
    /// let activator = Activator::factory::<Greeter, _>(|_ctx| {
    ///     Ok(Greeter { greeting: "hello".to_string() })
    /// });
    /// ```
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<T> + Send + Sync + 'static,
    {
        Self {
            kind: ActivatorKind::Factory(Arc::new(move |ctx| {
                let value: AnyHandle = Arc::new(factory(ctx)?);
                Ok(value)
            })),
        }
    }

    /// Factory activator for a trait object (or any component the factory
    /// already hands back behind an `Arc`).
    pub fn arc_factory<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ActivationContext<'a>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            kind: ActivatorKind::Factory(Arc::new(move |ctx| {
                let value: AnyHandle = Arc::new(factory(ctx)?);
                Ok(value)
            })),
        }
    }

    /// Constructor-selecting activator over explicit candidates.
    pub fn constructors(candidates: Vec<ConstructorCandidate>) -> Self {
        Self {
            kind: ActivatorKind::Constructors(candidates),
        }
    }

    /// Single-use provided-instance activator for a concrete value.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        let handle: AnyHandle = Arc::new(value);
        Self {
            kind: ActivatorKind::Instance(ProvidedInstance::new(
                std::any::type_name::<T>(),
                handle,
            )),
        }
    }

    /// Single-use provided-instance activator for a trait object.
    pub fn trait_instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        let handle: AnyHandle = Arc::new(value);
        Self {
            kind: ActivatorKind::Instance(ProvidedInstance::new(
                std::any::type_name::<T>(),
                handle,
            )),
        }
    }

    pub(crate) fn raw(factory: FactoryFn) -> Self {
        Self {
            kind: ActivatorKind::Factory(factory),
        }
    }

    pub(crate) fn activate(
        &self,
        ctx: &ActivationContext<'_>,
        key_name: &'static str,
    ) -> ResolveResult<AnyHandle> {
        match &self.kind {
            ActivatorKind::Factory(factory) => factory(ctx),
            ActivatorKind::Constructors(candidates) => {
                let chosen = select_constructor(candidates, ctx)
                    .ok_or(ResolveError::AmbiguousConstructor(key_name))?;
                let mut values = Vec::with_capacity(chosen.params.len());
                for param in &chosen.params {
                    values.push(ctx.resolve_dependency(param)?);
                }
                (chosen.invoke)(ResolvedArgs { values })
            }
            ActivatorKind::Instance(provided) => provided.take(),
        }
    }
}

/// Among candidates whose parameters are all satisfiable, picks the one with
/// the most parameters; ties break by declaration order (earliest wins).
fn select_constructor<'a>(
    candidates: &'a [ConstructorCandidate],
    ctx: &ActivationContext<'_>,
) -> Option<&'a ConstructorCandidate> {
    let mut best: Option<&ConstructorCandidate> = None;
    for candidate in candidates {
        if !candidate.params.iter().all(|key| ctx.is_satisfiable(key)) {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => candidate.params.len() > current.params.len(),
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// One constructor option: an ordered list of parameter keys plus an invoke
/// function receiving the resolved values.
///
/// Candidates are explicit parameter-binding strategies emitted at
/// composition time; the runtime never inspects type metadata itself.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{ConstructorCandidate, ServiceKey};
/// use std::sync::Arc;
///
/// struct Database { url: Arc<String> }
///
/// let candidate = ConstructorCandidate::new::<Database, _>(
///     vec![ServiceKey::of::<String>()],
///     |args| Ok(Database { url: args.get::<String>(0)? }),
/// );
/// assert_eq!(candidate.params().len(), 1);
/// ```
pub struct ConstructorCandidate {
    params: Vec<ServiceKey>,
    invoke: Arc<dyn Fn(ResolvedArgs) -> ResolveResult<AnyHandle> + Send + Sync>,
}

impl ConstructorCandidate {
    /// Builds a candidate producing a concrete `T` from resolved arguments.
    pub fn new<T, F>(params: Vec<ServiceKey>, build: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolvedArgs) -> ResolveResult<T> + Send + Sync + 'static,
    {
        Self {
            params,
            invoke: Arc::new(move |args| {
                let value: AnyHandle = Arc::new(build(args)?);
                Ok(value)
            }),
        }
    }

    /// The ordered parameter keys of this candidate.
    pub fn params(&self) -> &[ServiceKey] {
        &self.params
    }
}

/// Positional access to the resolved parameter values of a constructor
/// candidate.
pub struct ResolvedArgs {
    values: Vec<AnyHandle>,
}

impl ResolvedArgs {
    /// The concrete value at `index`.
    pub fn get<P: Send + Sync + 'static>(&self, index: usize) -> ResolveResult<Arc<P>> {
        let handle = self
            .values
            .get(index)
            .ok_or(ResolveError::TypeMismatch(std::any::type_name::<P>()))?;
        handle
            .clone()
            .downcast::<P>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<P>()))
    }

    /// The trait-object value at `index`.
    pub fn get_trait<P: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> ResolveResult<Arc<P>> {
        let handle = self
            .values
            .get(index)
            .ok_or(ResolveError::TypeMismatch(std::any::type_name::<P>()))?;
        handle
            .clone()
            .downcast::<Arc<P>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<P>()))
    }

    /// Number of resolved values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the candidate had zero parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A pre-built value handed out exactly once.
pub(crate) struct ProvidedInstance {
    name: &'static str,
    slot: Mutex<Option<AnyHandle>>,
}

impl ProvidedInstance {
    fn new(name: &'static str, value: AnyHandle) -> Self {
        Self {
            name,
            slot: Mutex::new(Some(value)),
        }
    }

    fn take(&self) -> ResolveResult<AnyHandle> {
        self.slot
            .lock()
            .take()
            .ok_or(ResolveError::AlreadyActivated(self.name))
    }
}

/// Explicit per-request parameter overrides.
///
/// Parameters apply to the activation of the directly requested component
/// only; nested dependency resolves see an empty set, so an override cannot
/// hijack an unrelated resolution deeper in the graph. They are consulted
/// before the registry both for constructor satisfiability and for value
/// binding.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{Parameters, RegistryBuilder, Resolver};
///
/// struct Tenant { name: String }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_transient_factory::<Tenant, _>(|ctx| {
///     let name = ctx
///         .parameter::<String>()
///         .map(|n| (*n).clone())
///         .unwrap_or_else(|| "default".to_string());
///     Ok(Tenant { name })
/// });
///
/// let root = builder.build();
/// let tenant = root
///     .resolve_with::<Tenant>(Parameters::new().with("acme".to_string()))
///     .unwrap();
/// assert_eq!(tenant.name, "acme");
/// ```
#[derive(Default)]
pub struct Parameters {
    values: Vec<(ServiceKey, AnyHandle)>,
}

impl Parameters {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value bound to the plain key of `T`.
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.push((ServiceKey::of::<T>(), Arc::new(value)));
        self
    }

    /// Adds a value bound to a qualified key of `T`.
    pub fn with_qualified<T: Send + Sync + 'static>(
        mut self,
        name: &'static str,
        value: T,
    ) -> Self {
        self.values
            .push((ServiceKey::qualified::<T>(name), Arc::new(value)));
        self
    }

    /// Whether no overrides were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn lookup(&self, key: &ServiceKey) -> Option<AnyHandle> {
        self.values
            .iter()
            .find(|(bound, _)| bound == key)
            .map(|(_, value)| value.clone())
    }
}
