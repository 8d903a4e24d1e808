//! Diagnostic observers for resolution traceability.
//!
//! Observers hook the resolve pipeline and scope lifecycle for structured
//! logging and performance monitoring. Calls are made synchronously during
//! resolution; keep implementations lightweight.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ResolveError;
use crate::key::ServiceKey;
use crate::scope::ScopeId;

/// Observer of resolution and scope lifecycle events.
///
/// All methods have empty default bodies; implement the ones you care about.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, ResolveObserver, Resolver, ServiceKey};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Counting {
///     resolutions: AtomicUsize,
/// }
///
/// impl ResolveObserver for Counting {
///     fn resolved(&self, _key: &ServiceKey, _elapsed: std::time::Duration) {
///         self.resolutions.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let counting = Arc::new(Counting::default());
/// let mut builder = RegistryBuilder::new();
/// builder.add_root_instance(5u32);
/// builder.observe(counting.clone());
///
/// let root = builder.build();
/// let _ = root.get::<u32>().unwrap();
/// assert!(counting.resolutions.load(Ordering::Relaxed) >= 1);
/// ```
pub trait ResolveObserver: Send + Sync {
    /// A resolve request entered the pipeline.
    fn resolving(&self, _key: &ServiceKey) {}

    /// A resolve request completed successfully.
    fn resolved(&self, _key: &ServiceKey, _elapsed: Duration) {}

    /// A resolve request failed.
    fn resolve_failed(&self, _key: &ServiceKey, _error: &ResolveError) {}

    /// A lifetime scope finished releasing.
    fn scope_released(&self, _scope: ScopeId) {}
}

/// Stderr logging observer.
pub struct LoggingObserver;

impl ResolveObserver for LoggingObserver {
    fn resolving(&self, key: &ServiceKey) {
        eprintln!("[wrought-di] resolving {}", key.display_name());
    }

    fn resolved(&self, key: &ServiceKey, elapsed: Duration) {
        eprintln!(
            "[wrought-di] resolved {} in {}ns",
            key.display_name(),
            elapsed.as_nanos()
        );
    }

    fn resolve_failed(&self, key: &ServiceKey, error: &ResolveError) {
        eprintln!("[wrought-di] failed {}: {}", key.display_name(), error);
    }

    fn scope_released(&self, scope: ScopeId) {
        eprintln!("[wrought-di] scope {} released", scope);
    }
}

/// Registered observer fan-out with a cheap emptiness fast path.
#[derive(Default)]
pub(crate) struct Observers {
    list: Vec<Arc<dyn ResolveObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, observer: Arc<dyn ResolveObserver>) {
        self.list.push(observer);
    }

    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn resolving(&self, key: &ServiceKey) {
        for observer in &self.list {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &ServiceKey, elapsed: Duration) {
        for observer in &self.list {
            observer.resolved(key, elapsed);
        }
    }

    pub(crate) fn resolve_failed(&self, key: &ServiceKey, error: &ResolveError) {
        for observer in &self.list {
            observer.resolve_failed(key, error);
        }
    }

    pub(crate) fn scope_released(&self, scope: ScopeId) {
        for observer in &self.list {
            observer.scope_released(scope);
        }
    }
}
