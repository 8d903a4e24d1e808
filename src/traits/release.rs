//! Release capability for owned instances.

/// Trait for components that need structured teardown.
///
/// Owned instances of components registered as releasable are enrolled in
/// their owning scope's disposer list during resolution and released in
/// reverse creation order when the scope is released.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Releasable, Resolver, Sharing};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Flusher {
///     flushed: Arc<AtomicBool>,
/// }
///
/// impl Releasable for Flusher {
///     fn release(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let flushed = Arc::new(AtomicBool::new(false));
/// let flushed_clone = flushed.clone();
///
/// let mut builder = RegistryBuilder::new();
/// builder
///     .component::<Flusher>()
///     .sharing(Sharing::Scoped)
///     .factory(move |_| Ok(Flusher { flushed: flushed_clone.clone() }))
///     .releasable()
///     .register();
///
/// let root = builder.build();
/// let scope = root.begin_scope().unwrap();
/// let _ = scope.get::<Flusher>().unwrap();
/// scope.release();
/// assert!(flushed.load(Ordering::SeqCst));
/// ```
pub trait Releasable: Send + Sync {
    /// Performs teardown of held resources.
    fn release(&self);
}
