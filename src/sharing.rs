//! Sharing and ownership policies.

/// Instance sharing policy controlling where an instance is cached
///
/// # Sharing Characteristics
///
/// - **Root**: one instance for the whole scope tree, cached at the root
/// - **Scoped**: one instance per requesting scope
/// - **Transient**: a fresh instance on every resolution, never cached
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, Resolver};
/// use std::sync::Arc;
///
/// struct Settings { name: &'static str }
/// struct Session { id: u32 }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_root_instance(Settings { name: "app" });
/// builder.add_scoped_factory::<Session, _>(|_| Ok(Session { id: 7 }));
///
/// let root = builder.build();
/// let scope = root.begin_scope().unwrap();
///
/// // Root sharing: identical instance from any scope in the tree.
/// let a = root.get::<Settings>().unwrap();
/// let b = scope.get::<Settings>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// // Per-scope sharing: identical within a scope, distinct across scopes.
/// let s1 = scope.get::<Session>().unwrap();
/// let s2 = scope.get::<Session>().unwrap();
/// assert!(Arc::ptr_eq(&s1, &s2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharing {
    /// New instance per resolution, never cached
    Transient,
    /// Single instance per requesting scope, cached for the scope lifetime
    Scoped,
    /// Single instance per scope tree, cached at the root scope
    Root,
}

/// Who is responsible for releasing instances of a component
///
/// Owned instances with a release hook are enrolled in the owning scope's
/// disposer list and released when the scope is released. External instances
/// are never enrolled; the caller keeps responsibility for their teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The owning scope releases the instance during teardown
    Owned,
    /// The caller retains release responsibility
    External,
}
