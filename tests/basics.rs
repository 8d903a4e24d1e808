use std::sync::Arc;

use wrought_di::{
    ConstructorCandidate, Parameters, RegistrationModule, RegistryBuilder, ResolveError,
    ResolveResult, Resolver, ServiceKey, Sharing,
};

#[test]
fn test_root_instance_is_shared() {
    struct Config {
        url: String,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_root_instance(Config {
        url: "postgres://localhost".to_string(),
    });

    let root = builder.build();
    let a = root.get::<Config>().unwrap();
    let b = root.get::<Config>().unwrap();

    assert_eq!(a.url, "postgres://localhost");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_factory_receives_dependencies() {
    struct Database {
        url: String,
    }

    struct Repository {
        db: Arc<Database>,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_root_factory::<Database, _>(|_| {
        Ok(Database {
            url: "sqlite://memory".to_string(),
        })
    });
    builder.add_transient_factory::<Repository, _>(|ctx| {
        Ok(Repository {
            db: ctx.get::<Database>()?,
        })
    });

    let root = builder.build();
    let repo = root.get::<Repository>().unwrap();
    assert_eq!(repo.db.url, "sqlite://memory");
}

#[test]
fn test_later_registration_takes_precedence() {
    struct Flag(&'static str);

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<Flag, _>(|_| Ok(Flag("first")));
    builder.add_transient_factory::<Flag, _>(|_| Ok(Flag("second")));

    let root = builder.build();
    assert_eq!(root.get::<Flag>().unwrap().0, "second");
}

#[test]
fn test_qualified_registrations() {
    struct Endpoint(u16);

    let mut builder = RegistryBuilder::new();
    builder
        .component::<Endpoint>()
        .qualified("http")
        .factory(|_| Ok(Endpoint(80)))
        .register();
    builder
        .component::<Endpoint>()
        .qualified("https")
        .factory(|_| Ok(Endpoint(443)))
        .register();

    let root = builder.build();
    assert_eq!(root.get_qualified::<Endpoint>("http").unwrap().0, 80);
    assert_eq!(root.get_qualified::<Endpoint>("https").unwrap().0, 443);

    // The qualified registrations do not answer the bare key.
    assert!(matches!(
        root.get::<Endpoint>(),
        Err(ResolveError::NotRegistered(_))
    ));
}

#[test]
fn test_trait_registrations() {
    trait Codec: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Json;
    impl Codec for Json {
        fn name(&self) -> &'static str {
            "json"
        }
    }

    let mut builder = RegistryBuilder::new();
    builder.add_root_trait_factory::<dyn Codec, _>(|_| Ok(Arc::new(Json)));

    let root = builder.build();
    let codec = root.get_trait::<dyn Codec>().unwrap();
    assert_eq!(codec.name(), "json");

    let again = root.get_trait::<dyn Codec>().unwrap();
    assert!(Arc::ptr_eq(&codec, &again));
}

#[test]
fn test_constructor_selection_prefers_most_parameters() {
    struct Service {
        via: &'static str,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_root_instance(5u32);
    builder
        .component::<Service>()
        .constructor(ConstructorCandidate::new::<Service, _>(vec![], |_| {
            Ok(Service { via: "empty" })
        }))
        .constructor(ConstructorCandidate::new::<Service, _>(
            vec![ServiceKey::of::<u32>()],
            |args| {
                let _ = args.get::<u32>(0)?;
                Ok(Service { via: "one" })
            },
        ))
        .constructor(ConstructorCandidate::new::<Service, _>(
            // String is unregistered, so this two-parameter candidate is
            // not satisfiable despite being the largest.
            vec![ServiceKey::of::<u32>(), ServiceKey::of::<String>()],
            |_| Ok(Service { via: "two" }),
        ))
        .register();

    let root = builder.build();
    assert_eq!(root.get::<Service>().unwrap().via, "one");
}

#[test]
fn test_constructor_tie_breaks_by_declaration_order() {
    struct Service {
        via: &'static str,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_root_instance(5u32);
    builder.add_root_instance(7u64);
    builder
        .component::<Service>()
        .constructor(ConstructorCandidate::new::<Service, _>(
            vec![ServiceKey::of::<u32>()],
            |_| Ok(Service { via: "declared-first" }),
        ))
        .constructor(ConstructorCandidate::new::<Service, _>(
            vec![ServiceKey::of::<u64>()],
            |_| Ok(Service { via: "declared-second" }),
        ))
        .register();

    let root = builder.build();
    assert_eq!(root.get::<Service>().unwrap().via, "declared-first");
}

#[test]
fn test_no_satisfiable_constructor() {
    #[derive(Debug)]
    struct Service;

    let mut builder = RegistryBuilder::new();
    builder
        .component::<Service>()
        .constructor(ConstructorCandidate::new::<Service, _>(
            vec![ServiceKey::of::<String>()],
            |_| Ok(Service),
        ))
        .register();

    let root = builder.build();
    let error = root.get::<Service>().unwrap_err();
    assert!(matches!(
        error.root_cause(),
        ResolveError::AmbiguousConstructor(_)
    ));
}

#[test]
fn test_explicit_parameters_bind_constructor_arguments() {
    struct Greeting {
        text: Arc<String>,
    }

    let mut builder = RegistryBuilder::new();
    builder
        .component::<Greeting>()
        .constructor(ConstructorCandidate::new::<Greeting, _>(
            vec![ServiceKey::of::<String>()],
            |args| {
                Ok(Greeting {
                    text: args.get::<String>(0)?,
                })
            },
        ))
        .register();

    let root = builder.build();

    // Without the parameter the only candidate is unsatisfiable.
    assert!(root.get::<Greeting>().is_err());

    let greeting = root
        .resolve_with::<Greeting>(Parameters::new().with("hello".to_string()))
        .unwrap();
    assert_eq!(greeting.text.as_str(), "hello");
}

#[test]
fn test_explicit_parameters_do_not_leak_into_dependencies() {
    struct Inner {
        label: String,
    }

    struct Outer {
        inner: Arc<Inner>,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<Inner, _>(|ctx| {
        let label = ctx
            .parameter::<String>()
            .map(|s| (*s).clone())
            .unwrap_or_else(|| "default".to_string());
        Ok(Inner { label })
    });
    builder.add_transient_factory::<Outer, _>(|ctx| {
        Ok(Outer {
            inner: ctx.get::<Inner>()?,
        })
    });

    let root = builder.build();

    // Parameters reach the requested component...
    let inner = root
        .resolve_with::<Inner>(Parameters::new().with("explicit".to_string()))
        .unwrap();
    assert_eq!(inner.label, "explicit");

    // ...but not its nested dependencies.
    let outer = root
        .resolve_with::<Outer>(Parameters::new().with("explicit".to_string()))
        .unwrap();
    assert_eq!(outer.inner.label, "default");
}

#[test]
fn test_provided_instance_is_single_use() {
    #[derive(Debug)]
    struct Token(u32);

    let mut builder = RegistryBuilder::new();
    builder
        .component::<Token>()
        .sharing(Sharing::Transient)
        .instance(Token(1))
        .register();

    let root = builder.build();
    assert_eq!(root.get::<Token>().unwrap().0, 1);

    let error = root.get::<Token>().unwrap_err();
    assert!(matches!(
        error.root_cause(),
        ResolveError::AlreadyActivated(_)
    ));
}

#[test]
fn test_provided_instance_with_root_sharing_activates_once() {
    struct Token(u32);

    let mut builder = RegistryBuilder::new();
    builder.add_root_instance(Token(9));

    let root = builder.build();
    let a = root.get::<Token>().unwrap();
    let b = root.get::<Token>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.0, 9);
}

#[test]
fn test_activation_failure_is_wrapped_with_the_path() {
    #[derive(Debug)]
    struct Leaf;
    #[derive(Debug)]
    struct Branch {
        _leaf: Arc<Leaf>,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<Leaf, _>(|_| {
        Err(ResolveError::activation("disk unavailable"))
    });
    builder.add_transient_factory::<Branch, _>(|ctx| {
        Ok(Branch {
            _leaf: ctx.get::<Leaf>()?,
        })
    });

    let root = builder.build();
    let error = root.get::<Branch>().unwrap_err();

    assert!(matches!(error.root_cause(), ResolveError::Activation(_)));
    let path = error.dependency_path();
    assert!(path.iter().any(|key| key.contains("Branch")));
    assert!(path.iter().any(|key| key.contains("Leaf")));
}

#[test]
fn test_registration_module() {
    struct CacheConfig {
        capacity: usize,
    }

    struct Cache {
        config: Arc<CacheConfig>,
    }

    struct CacheModule;

    impl RegistrationModule for CacheModule {
        fn register(self, builder: &mut RegistryBuilder) -> ResolveResult<()> {
            builder.add_root_instance(CacheConfig { capacity: 128 });
            builder.add_scoped_factory::<Cache, _>(|ctx| {
                Ok(Cache {
                    config: ctx.get::<CacheConfig>()?,
                })
            });
            Ok(())
        }
    }

    let mut builder = RegistryBuilder::new();
    builder.add_module(CacheModule).unwrap();

    let root = builder.build();
    let scope = root.begin_scope().unwrap();
    assert_eq!(scope.get::<Cache>().unwrap().config.capacity, 128);
}
