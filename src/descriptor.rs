//! Component descriptors: immutable registration records.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::activator::Activator;
use crate::key::ServiceKey;
use crate::sharing::{Ownership, Sharing};
use crate::traits::Releasable;

/// Type-erased shared instance handle.
///
/// Concrete components are stored as `Arc<T>`; trait-object components are
/// stored as `Arc<Arc<dyn Trait>>` so the handle itself stays sized.
pub type AnyHandle = Arc<dyn std::any::Any + Send + Sync>;

/// One-shot release action for an owned instance.
pub type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Derives a release action from an instance handle, if the handle carries
/// the expected concrete type.
pub(crate) type ReleaseHook = Arc<dyn Fn(&AnyHandle) -> Option<ReleaseFn> + Send + Sync>;

/// Globally unique, immutable descriptor identity.
///
/// Ids are allocated from a monotonic counter at composition time, so they
/// double as registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(u64);

impl DescriptorId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        DescriptorId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value, for diagnostics.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Immutable registration record describing how to produce instances
/// satisfying one or more service keys.
///
/// Descriptors are created once at composition time and never mutated
/// afterwards; the registry and every scope share them behind `Arc`.
///
/// Most registrations go through the typed sugar on
/// [`RegistryBuilder`](crate::RegistryBuilder); building descriptors directly
/// is the low-level surface used by registration sources and
/// descriptor-producing collaborators.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{Activator, ComponentDescriptor, RegistryBuilder, Resolver, ServiceKey, Sharing};
///
/// struct Clock;
///
/// let descriptor = ComponentDescriptor::new(
///     vec![ServiceKey::of::<Clock>()],
///     Activator::factory::<Clock, _>(|_| Ok(Clock)),
///     Sharing::Root,
/// );
///
/// let mut builder = RegistryBuilder::new();
/// builder.register(descriptor);
/// let root = builder.build();
/// assert!(root.get::<Clock>().is_ok());
/// ```
pub struct ComponentDescriptor {
    id: DescriptorId,
    keys: Vec<ServiceKey>,
    activator: Activator,
    sharing: Sharing,
    ownership: Ownership,
    release: Option<ReleaseHook>,
}

impl ComponentDescriptor {
    /// Creates an owned descriptor with no release hook.
    pub fn new(keys: Vec<ServiceKey>, activator: Activator, sharing: Sharing) -> Self {
        Self {
            id: DescriptorId::next(),
            keys,
            activator,
            sharing,
            ownership: Ownership::Owned,
            release: None,
        }
    }

    /// Marks instances of this component as externally owned: the runtime
    /// never enrolls them for release.
    pub fn externally_owned(mut self) -> Self {
        self.ownership = Ownership::External;
        self
    }

    /// Installs a release hook for instances stored as `Arc<T>`.
    pub fn releasable<T: Releasable + 'static>(mut self) -> Self {
        self.release = Some(release_hook::<T>());
        self
    }

    /// Installs a release hook for trait-object instances stored as
    /// `Arc<Arc<T>>`.
    pub fn releasable_trait<T: ?Sized + Releasable + 'static>(mut self) -> Self {
        self.release = Some(release_hook_trait::<T>());
        self
    }

    pub(crate) fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release = Some(hook);
        self
    }

    /// Unique descriptor identity.
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// The service keys this descriptor satisfies.
    pub fn keys(&self) -> &[ServiceKey] {
        &self.keys
    }

    /// Sharing policy.
    pub fn sharing(&self) -> Sharing {
        self.sharing
    }

    /// Ownership policy.
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub(crate) fn activator(&self) -> &Activator {
        &self.activator
    }

    /// Release action for an instance of this component, if it exposes a
    /// releasable capability.
    pub(crate) fn release_for(&self, instance: &AnyHandle) -> Option<ReleaseFn> {
        self.release.as_ref().and_then(|hook| hook(instance))
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("id", &self.id)
            .field("keys", &self.keys)
            .field("sharing", &self.sharing)
            .field("ownership", &self.ownership)
            .field("releasable", &self.release.is_some())
            .finish()
    }
}

pub(crate) fn release_hook<T: Releasable + 'static>() -> ReleaseHook {
    Arc::new(|instance: &AnyHandle| {
        let value = instance.clone().downcast::<T>().ok()?;
        Some(Box::new(move || value.release()) as ReleaseFn)
    })
}

pub(crate) fn release_hook_trait<T: ?Sized + Releasable + 'static>() -> ReleaseHook {
    Arc::new(|instance: &AnyHandle| {
        let value = instance.clone().downcast::<Arc<T>>().ok()?;
        Some(Box::new(move || value.release()) as ReleaseFn)
    })
}
