use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wrought_di::{RegistryBuilder, Resolver};

trait Pipeline: Send + Sync {
    fn describe(&self) -> String;
}

struct Base;
impl Pipeline for Base {
    fn describe(&self) -> String {
        "base".to_string()
    }
}

struct Logged {
    inner: Arc<dyn Pipeline>,
}
impl Pipeline for Logged {
    fn describe(&self) -> String {
        format!("logged({})", self.inner.describe())
    }
}

struct Retried {
    inner: Arc<dyn Pipeline>,
}
impl Pipeline for Retried {
    fn describe(&self) -> String {
        format!("retried({})", self.inner.describe())
    }
}

#[test]
fn test_decorators_compose_in_registration_order() {
    let mut builder = RegistryBuilder::new();
    builder.add_transient_trait_factory::<dyn Pipeline, _>(|_| Ok(Arc::new(Base)));
    builder.decorate_trait::<dyn Pipeline, _>(|inner, _| Ok(Arc::new(Logged { inner })));
    builder.decorate_trait::<dyn Pipeline, _>(|inner, _| Ok(Arc::new(Retried { inner })));

    let root = builder.build();
    let pipeline = root.get_trait::<dyn Pipeline>().unwrap();

    // The decorator registered last is the outermost wrapper.
    assert_eq!(pipeline.describe(), "retried(logged(base))");
}

#[test]
fn test_decorated_instance_is_what_gets_cached() {
    let applications = Arc::new(AtomicUsize::new(0));
    let applications_clone = applications.clone();

    let mut builder = RegistryBuilder::new();
    builder.add_scoped_trait_factory::<dyn Pipeline, _>(|_| Ok(Arc::new(Base)));
    builder.decorate_trait::<dyn Pipeline, _>(move |inner, _| {
        applications_clone.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Logged { inner }))
    });

    let root = builder.build();
    let scope = root.begin_scope().unwrap();

    let first = scope.get_trait::<dyn Pipeline>().unwrap();
    let second = scope.get_trait::<dyn Pipeline>().unwrap();

    assert_eq!(first.describe(), "logged(base)");
    assert!(Arc::ptr_eq(&first, &second));
    // Wrapping ran once; the cache holds the decorated instance.
    assert_eq!(applications.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concrete_type_decoration() {
    struct Counter {
        value: usize,
    }

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<Counter, _>(|_| Ok(Counter { value: 1 }));
    builder.decorate_type::<Counter, _>(|inner, _| {
        Ok(Arc::new(Counter {
            value: inner.value + 10,
        }))
    });
    builder.decorate_type::<Counter, _>(|inner, _| {
        Ok(Arc::new(Counter {
            value: inner.value * 2,
        }))
    });

    let root = builder.build();
    // (1 + 10) * 2: first-registered decorator is innermost.
    assert_eq!(root.get::<Counter>().unwrap().value, 22);
}

#[test]
fn test_decorator_applies_to_qualified_keys_of_the_type() {
    struct Port(u16);

    let mut builder = RegistryBuilder::new();
    builder
        .component::<Port>()
        .qualified("admin")
        .factory(|_| Ok(Port(9000)))
        .register();
    builder.decorate_type::<Port, _>(|inner, _| Ok(Arc::new(Port(inner.0 + 1))));

    let root = builder.build();
    assert_eq!(root.get_qualified::<Port>("admin").unwrap().0, 9001);
}

#[test]
fn test_decorator_can_resolve_collaborators() {
    struct Prefix(&'static str);

    let mut builder = RegistryBuilder::new();
    builder.add_root_instance(Prefix(">> "));
    builder.add_transient_trait_factory::<dyn Pipeline, _>(|_| Ok(Arc::new(Base)));
    builder.decorate_trait::<dyn Pipeline, _>(|inner, ctx| {
        struct Prefixed {
            prefix: &'static str,
            inner: Arc<dyn Pipeline>,
        }
        impl Pipeline for Prefixed {
            fn describe(&self) -> String {
                format!("{}{}", self.prefix, self.inner.describe())
            }
        }
        let prefix = ctx.get::<Prefix>()?;
        Ok(Arc::new(Prefixed {
            prefix: prefix.0,
            inner,
        }))
    });

    let root = builder.build();
    let pipeline = root.get_trait::<dyn Pipeline>().unwrap();
    assert_eq!(pipeline.describe(), ">> base");
}

#[test]
fn test_undecorated_types_are_untouched() {
    struct Plain(u32);
    struct Other(u32);

    let mut builder = RegistryBuilder::new();
    builder.add_transient_factory::<Plain, _>(|_| Ok(Plain(5)));
    builder.add_transient_factory::<Other, _>(|_| Ok(Other(6)));
    builder.decorate_type::<Other, _>(|inner, _| Ok(Arc::new(Other(inner.0 * 100))));

    let root = builder.build();
    assert_eq!(root.get::<Plain>().unwrap().0, 5);
    assert_eq!(root.get::<Other>().unwrap().0, 600);
}

#[test]
fn test_sequence_elements_are_decorated() {
    let mut builder = RegistryBuilder::new();
    builder.add_transient_trait_factory::<dyn Pipeline, _>(|_| Ok(Arc::new(Base)));
    builder.decorate_trait::<dyn Pipeline, _>(|inner, _| Ok(Arc::new(Logged { inner })));

    let root = builder.build();
    let all = root.get_trait_sequence::<dyn Pipeline>().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].describe(), "logged(base)");
}
