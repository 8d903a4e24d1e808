use std::sync::Arc;

use wrought_di::{RegistryBuilder, ResolveError, Resolver};

#[test]
fn test_self_referencing_component() {
    #[derive(Debug)]
    struct SelfReferencing;

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<SelfReferencing, _>(|ctx| {
        let _ = ctx.get::<SelfReferencing>()?;
        Ok(SelfReferencing)
    });

    let root = builder.build();
    let error = root.get::<SelfReferencing>().unwrap_err();

    match error.root_cause() {
        ResolveError::CircularDependency(path) => {
            assert_eq!(path.len(), 2);
            assert!(path[0].contains("SelfReferencing"));
            assert!(path[1].contains("SelfReferencing"));
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_two_component_cycle_reports_the_full_path() {
    #[derive(Debug)]
    struct A {
        _b: Arc<B>,
    }

    #[derive(Debug)]
    struct B {
        _a: Arc<A>,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<A, _>(|ctx| Ok(A { _b: ctx.get::<B>()? }));
    builder.add_transient_factory::<B, _>(|ctx| Ok(B { _a: ctx.get::<A>()? }));

    let root = builder.build();
    let error = root.get::<A>().unwrap_err();

    match error.root_cause() {
        ResolveError::CircularDependency(path) => {
            assert_eq!(path.len(), 3);
            assert!(path[0].contains("::A"));
            assert!(path[1].contains("::B"));
            assert!(path[2].contains("::A"));
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_cycle_detected_before_any_instance_is_constructed() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    struct A {
        _b: Arc<B>,
    }

    struct B {
        _a: Arc<A>,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<A, _>(|ctx| {
        let b = ctx.get::<B>()?;
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Ok(A { _b: b })
    });
    builder.add_transient_factory::<B, _>(|ctx| {
        let a = ctx.get::<A>()?;
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Ok(B { _a: a })
    });

    let root = builder.build();
    assert!(root.get::<A>().is_err());
    assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cycle_through_trait_objects() {
    trait ServiceA: Send + Sync + std::fmt::Debug {}
    trait ServiceB: Send + Sync + std::fmt::Debug {}

    #[derive(Debug)]
    struct ImplA {
        _b: Arc<dyn ServiceB>,
    }
    impl ServiceA for ImplA {}

    #[derive(Debug)]
    struct ImplB {
        _a: Arc<dyn ServiceA>,
    }
    impl ServiceB for ImplB {}

    let mut builder = RegistryBuilder::new();
    builder.add_transient_trait_factory::<dyn ServiceA, _>(|ctx| {
        Ok(Arc::new(ImplA {
            _b: ctx.get_trait::<dyn ServiceB>()?,
        }))
    });
    builder.add_transient_trait_factory::<dyn ServiceB, _>(|ctx| {
        Ok(Arc::new(ImplB {
            _a: ctx.get_trait::<dyn ServiceA>()?,
        }))
    });

    let root = builder.build();
    let error = root.get_trait::<dyn ServiceA>().unwrap_err();
    assert!(matches!(
        error.root_cause(),
        ResolveError::CircularDependency(_)
    ));
}

#[test]
fn test_depth_limit_catches_runaway_recursion() {
    #[derive(Debug)]
    struct L0;
    struct L1;
    struct L2;
    struct L3;

    let mut builder = RegistryBuilder::new();
    builder.with_max_resolve_depth(3);
    builder.add_transient_factory::<L3, _>(|_| Ok(L3));
    builder.add_transient_factory::<L2, _>(|ctx| {
        let _ = ctx.get::<L3>()?;
        Ok(L2)
    });
    builder.add_transient_factory::<L1, _>(|ctx| {
        let _ = ctx.get::<L2>()?;
        Ok(L1)
    });
    builder.add_transient_factory::<L0, _>(|ctx| {
        let _ = ctx.get::<L1>()?;
        Ok(L0)
    });

    let root = builder.build();
    let error = root.get::<L0>().unwrap_err();
    assert!(matches!(error.root_cause(), ResolveError::DepthExceeded(_)));

    // A chain within the limit still resolves.
    assert!(root.get::<L2>().is_ok());
}

#[test]
fn test_stack_unwinds_cleanly_after_nested_failures() {
    struct Tolerant {
        value: Arc<u32>,
    }

    struct Missing;

    let mut builder = RegistryBuilder::new();
    builder.add_root_instance(11u32);
    builder.add_transient_factory::<Tolerant, _>(|ctx| {
        // A failed nested resolve must pop its stack frame; the factory
        // recovers and keeps resolving.
        assert!(ctx.get::<Missing>().is_err());
        Ok(Tolerant {
            value: ctx.get::<u32>()?,
        })
    });

    let root = builder.build();
    let tolerant = root.get::<Tolerant>().unwrap();
    assert_eq!(*tolerant.value, 11);

    // And the next top-level operation starts from a clean stack.
    assert_eq!(*root.get::<Tolerant>().unwrap().value, 11);
}

#[test]
fn test_failed_resolve_does_not_poison_the_scope() {
    struct A {
        _b: Arc<B>,
    }

    struct B {
        _a: Arc<A>,
    }

    struct Healthy;

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<A, _>(|ctx| Ok(A { _b: ctx.get::<B>()? }));
    builder.add_transient_factory::<B, _>(|ctx| Ok(B { _a: ctx.get::<A>()? }));
    builder.add_scoped_factory::<Healthy, _>(|_| Ok(Healthy));

    let root = builder.build();
    assert!(root.get::<A>().is_err());
    assert!(root.get::<Healthy>().is_ok());
}
