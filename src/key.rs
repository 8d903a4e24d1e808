//! Service key types for component lookup.

use std::any::TypeId;

/// Identity of a requested capability.
///
/// A key combines a type identity with an optional qualifier name, plus a
/// lookup shape. Two keys are equal iff their shape, type identity and
/// qualifier all match; the human-readable type name is carried for
/// diagnostics only and never participates in equality or hashing.
///
/// # Shapes
///
/// - **Service**: one component of a concrete type or trait object
/// - **Qualified**: like `Service`, with an additional qualifier name
/// - **Sequence**: every registration of the element type, in registration order
/// - **Group**: qualified registrations of the element type, keyed by qualifier
/// - **Deferred**: a lazily-invoked accessor for the element key
///
/// # Examples
///
/// ```rust
/// use wrought_di::ServiceKey;
///
/// let plain = ServiceKey::of::<u32>();
/// let named = ServiceKey::qualified::<u32>("port");
/// assert_ne!(plain, named);
/// assert_eq!(named.qualifier(), Some("port"));
///
/// // Sequence keys identify "all registrations of T", not T itself.
/// assert_ne!(ServiceKey::sequence_of::<u32>(), plain);
/// ```
#[derive(Debug, Clone)]
pub enum ServiceKey {
    /// Single component of a type identity.
    Service(TypeId, &'static str),
    /// Single component of a type identity under a qualifier name.
    Qualified(TypeId, &'static str, &'static str),
    /// Every registration of the element type.
    Sequence(TypeId, &'static str),
    /// Qualified registrations of the element type, grouped by qualifier.
    Group(TypeId, &'static str),
    /// Lazily-resolved accessor for the element key.
    Deferred(TypeId, &'static str, Option<&'static str>),
}

impl ServiceKey {
    /// Key for a single component of type `T`.
    ///
    /// Works for concrete types and trait objects alike, since `TypeId`
    /// supports unsized types.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        ServiceKey::Service(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key for a single component of type `T` under a qualifier name.
    #[inline(always)]
    pub fn qualified<T: ?Sized + 'static>(name: &'static str) -> Self {
        ServiceKey::Qualified(TypeId::of::<T>(), std::any::type_name::<T>(), name)
    }

    /// Key for every registration of element type `T`.
    #[inline(always)]
    pub fn sequence_of<T: ?Sized + 'static>() -> Self {
        ServiceKey::Sequence(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key for the qualified registrations of element type `T`.
    #[inline(always)]
    pub fn group_of<T: ?Sized + 'static>() -> Self {
        ServiceKey::Group(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key for a deferred accessor to element type `T`.
    #[inline(always)]
    pub fn deferred_of<T: ?Sized + 'static>() -> Self {
        ServiceKey::Deferred(TypeId::of::<T>(), std::any::type_name::<T>(), None)
    }

    /// Key for a deferred accessor to a qualified registration of `T`.
    #[inline(always)]
    pub fn deferred_qualified<T: ?Sized + 'static>(name: &'static str) -> Self {
        ServiceKey::Deferred(TypeId::of::<T>(), std::any::type_name::<T>(), Some(name))
    }

    /// Human-readable type name for diagnostics.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKey::Service(_, name) => name,
            ServiceKey::Qualified(_, name, _) => name,
            ServiceKey::Sequence(_, name) => name,
            ServiceKey::Group(_, name) => name,
            ServiceKey::Deferred(_, name, _) => name,
        }
    }

    /// Qualifier name, or `None` for unqualified keys.
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            ServiceKey::Qualified(_, _, name) => Some(name),
            ServiceKey::Deferred(_, _, name) => *name,
            _ => None,
        }
    }

    /// Type identity of the component (or element type for collection and
    /// deferred shapes).
    pub fn type_id(&self) -> TypeId {
        match self {
            ServiceKey::Service(id, _)
            | ServiceKey::Qualified(id, _, _)
            | ServiceKey::Sequence(id, _)
            | ServiceKey::Group(id, _)
            | ServiceKey::Deferred(id, _, _) => *id,
        }
    }

    /// Whether a lookup for this key yields a collection.
    ///
    /// Collection-shaped lookups with zero candidates produce an empty
    /// result rather than a not-registered failure.
    pub fn is_collection(&self) -> bool {
        matches!(self, ServiceKey::Sequence(_, _) | ServiceKey::Group(_, _))
    }

    /// Whether this key names a single component directly.
    pub fn is_single(&self) -> bool {
        matches!(self, ServiceKey::Service(_, _) | ServiceKey::Qualified(_, _, _))
    }

    /// The element key wrapped by a collection or deferred shape.
    pub(crate) fn element(&self) -> Option<ServiceKey> {
        match self {
            ServiceKey::Sequence(id, name) | ServiceKey::Group(id, name) => {
                Some(ServiceKey::Service(*id, name))
            }
            ServiceKey::Deferred(id, name, None) => Some(ServiceKey::Service(*id, name)),
            ServiceKey::Deferred(id, name, Some(qualifier)) => {
                Some(ServiceKey::Qualified(*id, name, qualifier))
            }
            _ => None,
        }
    }
}

// Equality on the hot path compares TypeId and qualifier only; the name
// string is diagnostic payload.
impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ServiceKey::Service(a, _), ServiceKey::Service(b, _)) => a == b,
            (ServiceKey::Qualified(a, _, qa), ServiceKey::Qualified(b, _, qb)) => {
                a == b && qa == qb
            }
            (ServiceKey::Sequence(a, _), ServiceKey::Sequence(b, _)) => a == b,
            (ServiceKey::Group(a, _), ServiceKey::Group(b, _)) => a == b,
            (ServiceKey::Deferred(a, _, qa), ServiceKey::Deferred(b, _, qb)) => {
                a == b && qa == qb
            }
            _ => false,
        }
    }
}

impl Eq for ServiceKey {}

impl std::hash::Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ServiceKey::Service(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            ServiceKey::Qualified(id, _, qualifier) => {
                1u8.hash(state);
                id.hash(state);
                qualifier.hash(state);
            }
            ServiceKey::Sequence(id, _) => {
                2u8.hash(state);
                id.hash(state);
            }
            ServiceKey::Group(id, _) => {
                3u8.hash(state);
                id.hash(state);
            }
            ServiceKey::Deferred(id, _, qualifier) => {
                4u8.hash(state);
                id.hash(state);
                qualifier.hash(state);
            }
        }
    }
}
