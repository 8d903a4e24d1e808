use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use wrought_di::{RegistryBuilder, ResolveError, Resolver};

#[test]
fn test_root_shared_identical_from_any_descendant() {
    struct Settings;

    let mut builder = RegistryBuilder::new();
    builder.add_root_factory::<Settings, _>(|_| Ok(Settings));

    let root = builder.build();
    let child = root.begin_scope().unwrap();
    let grandchild = child.begin_scope().unwrap();

    let a = root.get::<Settings>().unwrap();
    let b = child.get::<Settings>().unwrap();
    let c = grandchild.get::<Settings>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
}

#[test]
fn test_scoped_logger_scenario() {
    // Scope-shared logger registered at the root; S1 and S2 each get a
    // stable instance of their own.
    struct Logger {
        id: u32,
    }

    static NEXT: AtomicU32 = AtomicU32::new(0);

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_factory::<Logger, _>(|_| {
        Ok(Logger {
            id: NEXT.fetch_add(1, Ordering::SeqCst),
        })
    });

    let root = builder.build();
    let s1 = root.begin_scope().unwrap();
    let s2 = root.begin_scope().unwrap();

    let s1_first = s1.get::<Logger>().unwrap();
    let s1_second = s1.get::<Logger>().unwrap();
    assert!(Arc::ptr_eq(&s1_first, &s1_second));

    let s2_first = s2.get::<Logger>().unwrap();
    assert!(!Arc::ptr_eq(&s1_first, &s2_first));
    assert_ne!(s1_first.id, s2_first.id);

    let s2_second = s2.get::<Logger>().unwrap();
    assert!(Arc::ptr_eq(&s2_first, &s2_second));
}

#[test]
fn test_scoped_component_resolved_at_root_caches_at_root() {
    struct Session;

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_factory::<Session, _>(|_| Ok(Session));

    let root = builder.build();
    let a = root.get::<Session>().unwrap();
    let b = root.get::<Session>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_dependencies_resolve_in_the_requesting_scope() {
    struct PerScope {
        id: u32,
    }

    struct Consumer {
        per_scope: Arc<PerScope>,
    }

    static NEXT: AtomicU32 = AtomicU32::new(0);

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_factory::<PerScope, _>(|_| {
        Ok(PerScope {
            id: NEXT.fetch_add(1, Ordering::SeqCst),
        })
    });
    builder.add_transient_factory::<Consumer, _>(|ctx| {
        Ok(Consumer {
            per_scope: ctx.get::<PerScope>()?,
        })
    });

    let root = builder.build();
    let scope = root.begin_scope().unwrap();

    let consumer = scope.get::<Consumer>().unwrap();
    let direct = scope.get::<PerScope>().unwrap();
    assert!(Arc::ptr_eq(&consumer.per_scope, &direct));
}

#[test]
fn test_scope_local_registrations() {
    struct Tag(&'static str);
    struct Extra(u32);

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<Tag, _>(|_| Ok(Tag("root")));

    let root = builder.build();
    let child = root
        .begin_scope_with(|local| {
            local.add_transient_factory::<Tag, _>(|_| Ok(Tag("local")));
            local.add_scoped_factory::<Extra, _>(|_| Ok(Extra(3)));
        })
        .unwrap();

    // Local registration takes precedence inside the child...
    assert_eq!(child.get::<Tag>().unwrap().0, "local");
    // ...the parent still sees its own...
    assert_eq!(root.get::<Tag>().unwrap().0, "root");
    // ...and scope-local additions are invisible to the parent.
    assert_eq!(child.get::<Extra>().unwrap().0, 3);
    assert!(matches!(
        root.get::<Extra>(),
        Err(ResolveError::NotRegistered(_))
    ));
}

#[test]
fn test_scope_local_registrations_are_inherited_by_grandchildren() {
    struct Tag(&'static str);

    let root = RegistryBuilder::new().build();
    let child = root
        .begin_scope_with(|local| {
            local.add_transient_factory::<Tag, _>(|_| Ok(Tag("local")));
        })
        .unwrap();
    let grandchild = child.begin_scope().unwrap();

    assert_eq!(grandchild.get::<Tag>().unwrap().0, "local");
}

#[test]
fn test_operations_against_released_scope_fail() {
    struct Anything;

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_factory::<Anything, _>(|_| Ok(Anything));

    let root = builder.build();
    let scope = root.begin_scope().unwrap();
    scope.release();

    assert!(matches!(
        scope.get::<Anything>(),
        Err(ResolveError::ScopeReleased)
    ));
    assert!(matches!(
        scope.begin_scope(),
        Err(ResolveError::ScopeReleased)
    ));
}

#[test]
fn test_releasing_parent_releases_children() {
    struct Anything;

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_factory::<Anything, _>(|_| Ok(Anything));

    let root = builder.build();
    let parent = root.begin_scope().unwrap();
    let child = parent.begin_scope().unwrap();

    parent.release();

    assert!(parent.is_released());
    assert!(child.is_released());
    assert!(matches!(
        child.get::<Anything>(),
        Err(ResolveError::ScopeReleased)
    ));

    // The root is untouched.
    assert!(!root.is_released());
    assert!(root.begin_scope().is_ok());
}

#[test]
fn test_release_is_idempotent() {
    let root = RegistryBuilder::new().build();
    let scope = root.begin_scope().unwrap();

    scope.release();
    scope.release();
    assert!(scope.is_released());
}

#[test]
fn test_sibling_release_leaves_other_siblings_alive() {
    struct Counter {
        id: u32,
    }

    static NEXT: AtomicU32 = AtomicU32::new(0);

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_factory::<Counter, _>(|_| {
        Ok(Counter {
            id: NEXT.fetch_add(1, Ordering::SeqCst),
        })
    });

    let root = builder.build();
    let s1 = root.begin_scope().unwrap();
    let s2 = root.begin_scope().unwrap();

    let before = s2.get::<Counter>().unwrap();
    s1.release();

    let after = s2.get::<Counter>().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!s2.is_released());
}
