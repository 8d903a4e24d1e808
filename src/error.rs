//! Error types for the resolution runtime.

use std::fmt;

/// Resolution errors
///
/// Represents the failure conditions that can occur during composition,
/// resolution, or scope teardown.
///
/// Failures raised deep in an object graph are wrapped with resolution
/// context ([`ResolveError::ResolutionFailed`]) at each activation frame as
/// they propagate, so a failed top-level resolve carries the complete
/// dependency path. Use [`root_cause`](ResolveError::root_cause) to recover
/// the original failure and [`dependency_path`](ResolveError::dependency_path)
/// for the ordered key chain.
///
/// # Examples
///
/// ```rust
/// use wrought_di::{RegistryBuilder, ResolveError, Resolver};
///
/// let root = RegistryBuilder::new().build();
/// match root.get::<String>() {
///     Err(ResolveError::NotRegistered(name)) => {
///         assert_eq!(name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// No descriptor or source satisfies a required single-result key
    NotRegistered(&'static str),
    /// Cycle detected; carries the ordered key path from the first
    /// occurrence to the repeat
    CircularDependency(Vec<&'static str>),
    /// Resolve stack exceeded the configured maximum depth
    DepthExceeded(usize),
    /// A nested failure, wrapped with the key whose activation failed
    ResolutionFailed {
        /// Key of the component whose activation failed
        key: &'static str,
        /// The underlying failure
        source: Box<ResolveError>,
    },
    /// Activator-level failure raised by a factory or constructor
    Activation(String),
    /// Operation attempted against an already-released scope
    ScopeReleased,
    /// A single-use provided instance was activated a second time
    AlreadyActivated(&'static str),
    /// No constructor candidate has fully satisfiable parameters
    AmbiguousConstructor(&'static str),
    /// Type downcast failed at the typed resolution surface
    TypeMismatch(&'static str),
}

impl ResolveError {
    /// Builds an activator-level failure from a message.
    ///
    /// Intended for factories that need to signal a domain error; the
    /// pipeline wraps it with the resolution context on the way up.
    pub fn activation(message: impl Into<String>) -> Self {
        ResolveError::Activation(message.into())
    }

    /// The innermost failure, unwrapping any resolution-context layers.
    pub fn root_cause(&self) -> &ResolveError {
        let mut current = self;
        while let ResolveError::ResolutionFailed { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// The ordered chain of component keys the failure propagated through,
    /// outermost first.
    pub fn dependency_path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        let mut current = self;
        while let ResolveError::ResolutionFailed { key, source } = current {
            path.push(*key);
            current = source.as_ref();
        }
        path
    }

    /// Wraps this error with the key whose resolution it failed.
    pub(crate) fn in_context(self, key: &'static str) -> Self {
        ResolveError::ResolutionFailed {
            key,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotRegistered(name) => write!(f, "component not registered: {}", name),
            ResolveError::CircularDependency(path) => {
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
            ResolveError::DepthExceeded(depth) => {
                write!(f, "resolve stack depth {} exceeded", depth)
            }
            ResolveError::ResolutionFailed { key, source } => {
                write!(f, "error resolving {}: {}", key, source)
            }
            ResolveError::Activation(message) => write!(f, "activation failed: {}", message),
            ResolveError::ScopeReleased => write!(f, "lifetime scope already released"),
            ResolveError::AlreadyActivated(name) => {
                write!(f, "provided instance already activated: {}", name)
            }
            ResolveError::AmbiguousConstructor(name) => {
                write!(f, "no satisfiable constructor for: {}", name)
            }
            ResolveError::TypeMismatch(name) => write!(f, "type mismatch for: {}", name),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::ResolutionFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for resolution operations
///
/// A convenience alias for `Result<T, ResolveError>` used throughout the
/// crate.
pub type ResolveResult<T> = Result<T, ResolveError>;
