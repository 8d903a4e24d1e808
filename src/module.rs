//! Registration modules for grouping related registrations.

use crate::builder::RegistryBuilder;
use crate::error::ResolveResult;

/// A reusable unit of registrations.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistrationModule, RegistryBuilder, ResolveResult, Resolver};
/// use std::sync::Arc;
///
/// struct StorageConfig { path: &'static str }
/// struct Store { config: Arc<StorageConfig> }
///
/// struct StorageModule;
///
/// impl RegistrationModule for StorageModule {
///     fn register(self, builder: &mut RegistryBuilder) -> ResolveResult<()> {
///         builder.add_root_instance(StorageConfig { path: "/var/data" });
///         builder.add_scoped_factory::<Store, _>(|ctx| {
///             Ok(Store { config: ctx.get::<StorageConfig>()? })
///         });
///         Ok(())
///     }
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder.add_module(StorageModule).unwrap();
/// let root = builder.build();
/// let scope = root.begin_scope().unwrap();
/// assert_eq!(scope.get::<Store>().unwrap().config.path, "/var/data");
/// ```
pub trait RegistrationModule {
    /// Registers this module's components with the builder.
    fn register(self, builder: &mut RegistryBuilder) -> ResolveResult<()>;
}
