//! # wrought-di
//!
//! Component-based dependency resolution for Rust with hierarchical lifetime
//! scopes, registration sources, and deterministic teardown.
//!
//! ## Features
//!
//! - **Sharing modes**: root-shared, per-scope and transient components
//! - **Lifetime scope tree**: nested scopes with cascading, ordered release
//! - **Circular dependency detection**: per-request stack with full cycle paths
//! - **Registration sources**: sequences, qualifier groups, deferred
//!   accessors and descriptor templates synthesized on demand
//! - **Decorators**: post-activation wrapping composed in registration order
//! - **Thread-safe**: concurrent resolves create a shared instance exactly once
//!
//! ## Quick Start
//!
//! ```rust
//! use wrought_di::{RegistryBuilder, Resolver};
//! use std::sync::Arc;
//!
//! // Define your components
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! // Register components
//! let mut builder = RegistryBuilder::new();
//! builder.add_root_instance(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! builder.add_transient_factory::<UserService, _>(|ctx| {
//!     Ok(UserService {
//!         db: ctx.get::<Database>()?,
//!     })
//! });
//!
//! // Seal the registry and resolve from the root scope
//! let root = builder.build();
//! let users = root.get::<UserService>().unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Lifetime Scopes
//!
//! Scopes form a tree. A per-scope component is cached in the scope that
//! requested it; a root-shared component is cached at the tree's root no
//! matter which descendant asked. Releasing a scope releases its children
//! first, then its own instances in reverse creation order.
//!
//! ```rust
//! use wrought_di::{RegistryBuilder, Resolver};
//! use std::sync::Arc;
//!
//! struct RequestId(u32);
//!
//! let mut builder = RegistryBuilder::new();
//! builder.add_scoped_factory::<RequestId, _>(|_| Ok(RequestId(7)));
//!
//! let root = builder.build();
//! let s1 = root.begin_scope().unwrap();
//! let s2 = root.begin_scope().unwrap();
//!
//! let a = s1.get::<RequestId>().unwrap();
//! let b = s1.get::<RequestId>().unwrap();
//! let c = s2.get::<RequestId>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! assert!(!Arc::ptr_eq(&a, &c));
//! ```
//!
//! ## Trait Components
//!
//! ```rust
//! use wrought_di::{RegistryBuilder, Resolver};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! builder.add_root_trait_instance::<dyn Logger>(Arc::new(ConsoleLogger));
//!
//! let root = builder.build();
//! let logger = root.get_trait::<dyn Logger>().unwrap();
//! logger.log("hello");
//! ```

// Module declarations
pub mod activator;
pub mod builder;
pub mod context;
pub mod decorator;
pub mod descriptor;
pub mod error;
pub mod key;
pub mod module;
pub mod observer;
pub mod registry;
pub mod scope;
pub mod sharing;
pub mod sources;
pub mod traits;

// Internal modules
mod internal;
mod operation;
mod pipeline;

// Re-export core types
pub use activator::{Activator, ConstructorCandidate, Parameters, ResolvedArgs};
pub use builder::{ComponentBuilder, RegistryBuilder, TraitComponentBuilder};
pub use context::ActivationContext;
pub use decorator::Decorator;
pub use descriptor::{AnyHandle, ComponentDescriptor, DescriptorId, ReleaseFn};
pub use error::{ResolveError, ResolveResult};
pub use key::ServiceKey;
pub use module::RegistrationModule;
pub use observer::{LoggingObserver, ResolveObserver};
pub use registry::{ComponentRegistry, ResolveOptions, DEFAULT_MAX_RESOLVE_DEPTH};
pub use scope::{LifetimeScope, ScopeId};
pub use sharing::{Ownership, Sharing};
pub use sources::{
    Deferred, DeferredHandle, DescriptorTemplate, RegistrationSource, TemplateSource,
};
pub use traits::{Releasable, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_root_resolution() {
        let mut builder = RegistryBuilder::new();
        builder.add_root_instance(42usize);

        let root = builder.build();
        let a = root.get::<usize>().unwrap();
        let b = root.get::<usize>().unwrap();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b)); // Same instance
    }

    #[test]
    fn test_transient_resolution() {
        let mut builder = RegistryBuilder::new();
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        builder.add_transient_factory::<String, _>(move |_| {
            let mut n = counter_clone.lock().unwrap();
            *n += 1;
            Ok(format!("instance-{}", *n))
        });

        let root = builder.build();
        let a = root.get::<String>().unwrap();
        let b = root.get::<String>().unwrap();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
    }

    #[test]
    fn test_scoped_resolution() {
        let mut builder = RegistryBuilder::new();
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        builder.add_scoped_factory::<String, _>(move |_| {
            let mut n = counter_clone.lock().unwrap();
            *n += 1;
            Ok(format!("scoped-{}", *n))
        });

        let root = builder.build();

        // Same scope shares one instance
        let scope1 = root.begin_scope().unwrap();
        let s1a = scope1.get::<String>().unwrap();
        let s1b = scope1.get::<String>().unwrap();
        assert!(Arc::ptr_eq(&s1a, &s1b));

        // A sibling scope gets its own
        let scope2 = root.begin_scope().unwrap();
        let s2 = scope2.get::<String>().unwrap();
        assert!(!Arc::ptr_eq(&s1a, &s2));
    }

    #[test]
    fn test_trait_resolution() {
        trait Greeter: Send + Sync {
            fn greet(&self) -> i32;
        }

        struct FixedGreeter {
            value: i32,
        }

        impl Greeter for FixedGreeter {
            fn greet(&self) -> i32 {
                self.value
            }
        }

        let mut builder = RegistryBuilder::new();
        builder.add_root_trait_instance::<dyn Greeter>(Arc::new(FixedGreeter { value: 42 }));

        let root = builder.build();
        let greeter = root.get_trait::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), 42);
    }

    #[test]
    fn test_not_registered() {
        let root = RegistryBuilder::new().build();
        assert!(matches!(
            root.get::<String>(),
            Err(ResolveError::NotRegistered(_))
        ));
    }
}
