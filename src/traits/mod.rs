//! Public traits: release capability and resolution surfaces.

mod release;
mod resolver;

pub use release::Releasable;
pub use resolver::{Resolver, ResolverCore};
