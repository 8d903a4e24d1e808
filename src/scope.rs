//! Lifetime scopes: the sharing and teardown tree.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::activator::Parameters;
use crate::builder::RegistryBuilder;
use crate::descriptor::{AnyHandle, DescriptorId, ReleaseFn};
use crate::error::{ResolveError, ResolveResult};
use crate::internal::DisposeBag;
use crate::key::ServiceKey;
use crate::pipeline;
use crate::registry::ComponentRegistry;
use crate::traits::ResolverCore;

/// Scope identity for diagnostics and observer correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ScopeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the lifetime tree: the unit of instance sharing and of
/// cascading teardown.
///
/// The root scope is created when [`RegistryBuilder::build`] seals the
/// registry. Child scopes come from [`begin_scope`](LifetimeScope::begin_scope)
/// and are owned by their parent: a parent cannot be released while a child
/// remains un-released, because releasing the parent forces release of all
/// children first, depth-first, before the parent's own instances are
/// released in reverse creation order.
///
/// Scopes are thread-safe; `resolve`, `begin_scope` and `release` may race
/// freely. A resolve that loses a race against `release` fails with
/// [`ResolveError::ScopeReleased`] rather than returning an instance from a
/// half-torn-down scope.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
/// use std::sync::{Arc, Mutex};
///
/// struct Connection {
///     id: u32,
/// }
///
/// let mut builder = RegistryBuilder::new();
/// let counter = Arc::new(Mutex::new(0));
/// let counter_clone = counter.clone();
/// builder.add_scoped_factory::<Connection, _>(move |_| {
///     let mut n = counter_clone.lock().unwrap();
///     *n += 1;
///     Ok(Connection { id: *n })
/// });
///
/// let root = builder.build();
/// let s1 = root.begin_scope().unwrap();
/// let s2 = root.begin_scope().unwrap();
///
/// let a = s1.get::<Connection>().unwrap();
/// let b = s1.get::<Connection>().unwrap();
/// let c = s2.get::<Connection>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b)); // same scope, same instance
/// assert_ne!(a.id, c.id); // sibling scope, fresh instance
///
/// s1.release();
/// assert!(s1.get::<Connection>().is_err());
/// ```
pub struct LifetimeScope {
    id: ScopeId,
    registry: Arc<ComponentRegistry>,
    me: Weak<LifetimeScope>,
    parent: Weak<LifetimeScope>,
    root: Weak<LifetimeScope>,
    children: Mutex<Vec<Arc<LifetimeScope>>>,
    slots: Mutex<HashMap<DescriptorId, Arc<OnceCell<AnyHandle>>>>,
    disposers: Mutex<DisposeBag>,
    released: AtomicBool,
    teardown: Mutex<bool>,
}

impl LifetimeScope {
    pub(crate) fn root(registry: Arc<ComponentRegistry>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            id: ScopeId::next(),
            registry,
            me: me.clone(),
            parent: Weak::new(),
            root: me.clone(),
            children: Mutex::new(Vec::new()),
            slots: Mutex::new(HashMap::new()),
            disposers: Mutex::new(DisposeBag::default()),
            released: AtomicBool::new(false),
            teardown: Mutex::new(false),
        })
    }

    /// Begins a child scope sharing this scope's registrations.
    pub fn begin_scope(&self) -> ResolveResult<Arc<LifetimeScope>> {
        self.spawn(self.registry.clone())
    }

    /// Begins a child scope with scope-local registration additions.
    ///
    /// The child sees the parent's registrations plus whatever the delta
    /// adds; local registrations take single-result precedence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wrought_di::{RegistryBuilder, Resolver};
    ///
    /// struct Tag(&'static str);
    ///
    /// let mut builder = RegistryBuilder::new();
    /// builder.add_root_instance(Tag("root"));
    /// let root = builder.build();
    ///
    /// let child = root
    ///     .begin_scope_with(|local| {
    ///         local.add_scoped_factory::<Tag, _>(|_| Ok(Tag("local")));
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(child.get::<Tag>().unwrap().0, "local");
    /// assert_eq!(root.get::<Tag>().unwrap().0, "root");
    /// ```
    pub fn begin_scope_with<F>(&self, configure: F) -> ResolveResult<Arc<LifetimeScope>>
    where
        F: FnOnce(&mut RegistryBuilder),
    {
        let mut delta = RegistryBuilder::new();
        configure(&mut delta);
        let overlay = delta.build_overlay(self.registry.clone());
        self.spawn(overlay)
    }

    fn spawn(&self, registry: Arc<ComponentRegistry>) -> ResolveResult<Arc<LifetimeScope>> {
        let child = Arc::new_cyclic(|me| Self {
            id: ScopeId::next(),
            registry,
            me: me.clone(),
            parent: self.me.clone(),
            root: self.root.clone(),
            children: Mutex::new(Vec::new()),
            slots: Mutex::new(HashMap::new()),
            disposers: Mutex::new(DisposeBag::default()),
            released: AtomicBool::new(false),
            teardown: Mutex::new(false),
        });
        // The released check happens under the children lock so a racing
        // release either sees the new child or the spawn sees the release.
        let mut children = self.children.lock();
        if self.is_released() {
            return Err(ResolveError::ScopeReleased);
        }
        children.push(child.clone());
        Ok(child)
    }

    /// Whether this scope has begun (or finished) releasing.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Scope identity.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The registrations visible from this scope.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Resolves a component with explicit parameter overrides.
    pub fn resolve_with<T: Send + Sync + 'static>(
        &self,
        parameters: Parameters,
    ) -> ResolveResult<Arc<T>> {
        let handle = self.run_operation(&ServiceKey::of::<T>(), &parameters)?;
        handle
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Releases this scope: idempotent, cascading.
    ///
    /// Children release first, depth-first in reverse creation order; then
    /// this scope's own disposer list runs in reverse creation order; then
    /// the scope detaches from its parent. A second call after the first
    /// completes is a no-op, and a concurrent second call blocks until the
    /// first finishes.
    pub fn release(&self) {
        let mut done = self.teardown.lock();
        if *done {
            return;
        }
        self.released.store(true, Ordering::SeqCst);

        let children = {
            let mut children = self.children.lock();
            std::mem::take(&mut *children)
        };
        for child in children.iter().rev() {
            child.release();
        }
        drop(children);

        let mut bag = {
            let mut disposers = self.disposers.lock();
            std::mem::take(&mut *disposers)
        };
        bag.run_reverse();

        self.slots.lock().clear();

        if let Some(parent) = self.parent.upgrade() {
            parent.children.lock().retain(|sibling| sibling.id != self.id);
        }

        *done = true;
        self.registry.observers().scope_released(self.id);
    }

    /// Gets or creates the shared instance slot for a descriptor.
    ///
    /// The slot map lock is held only long enough to clone the cell; the
    /// cell itself serializes creation per (scope, descriptor), and a failed
    /// initializer leaves the cell empty so the next requester retries.
    pub(crate) fn get_or_create<F>(
        &self,
        descriptor: DescriptorId,
        init: F,
    ) -> ResolveResult<AnyHandle>
    where
        F: FnOnce() -> ResolveResult<AnyHandle>,
    {
        let cell = {
            let mut slots = self.slots.lock();
            if self.is_released() {
                return Err(ResolveError::ScopeReleased);
            }
            slots
                .entry(descriptor)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        let value = cell.get_or_try_init(init)?.clone();
        if self.is_released() {
            return Err(ResolveError::ScopeReleased);
        }
        Ok(value)
    }

    /// Appends a release hook, unless release has already begun.
    pub(crate) fn try_enroll(&self, hook: ReleaseFn) -> Result<(), ReleaseFn> {
        let mut disposers = self.disposers.lock();
        if self.is_released() {
            return Err(hook);
        }
        disposers.push(hook);
        Ok(())
    }

    pub(crate) fn root_scope(&self) -> ResolveResult<Arc<LifetimeScope>> {
        self.root.upgrade().ok_or(ResolveError::ScopeReleased)
    }

    fn run_operation(
        &self,
        key: &ServiceKey,
        parameters: &Parameters,
    ) -> ResolveResult<AnyHandle> {
        let me = self.me.upgrade().ok_or(ResolveError::ScopeReleased)?;
        if self.is_released() {
            return Err(ResolveError::ScopeReleased);
        }
        let operation =
            crate::operation::ResolveOperation::new(self.registry.options().max_depth);
        match pipeline::resolve_key(&me, key, parameters, &operation) {
            Ok(value) => {
                operation.commit(self)?;
                Ok(value)
            }
            Err(error) => {
                operation.rollback();
                Err(error)
            }
        }
    }
}

impl ResolverCore for LifetimeScope {
    fn resolve_key(&self, key: &ServiceKey) -> ResolveResult<AnyHandle> {
        let parameters = Parameters::default();
        self.run_operation(key, &parameters)
    }
}

impl fmt::Debug for LifetimeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifetimeScope")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}

impl Drop for LifetimeScope {
    fn drop(&mut self) {
        self.release();
    }
}
