#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use wrought_di::{RegistryBuilder, ResolveError, Resolver};

struct Leaf {
    value: u8,
}

struct Node {
    _leaf: Arc<Leaf>,
}

struct Cyclic;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let seed = data[0];
    let depth_limit = (data[1] as usize % 64) + 2;

    let mut builder = RegistryBuilder::new();
    builder.with_max_resolve_depth(depth_limit);
    builder.add_root_factory::<Leaf, _>(move |_| Ok(Leaf { value: seed }));
    builder.add_scoped_factory::<Node, _>(|ctx| Ok(Node { _leaf: ctx.get::<Leaf>()? }));
    builder.add_transient_factory::<Cyclic, _>(|ctx| {
        let _ = ctx.get::<Cyclic>()?;
        Ok(Cyclic)
    });

    let root = builder.build();

    // Scope churn driven by the input: begin, resolve, release.
    let mut scopes = Vec::new();
    for byte in data.iter().skip(2).take(64) {
        match byte % 4 {
            0 => {
                if let Ok(scope) = root.begin_scope() {
                    scopes.push(scope);
                }
            }
            1 => {
                if let Some(scope) = scopes.last() {
                    let node = scope.get::<Node>().unwrap();
                    assert_eq!(node._leaf.value, seed);
                }
            }
            2 => {
                if let Some(scope) = scopes.pop() {
                    scope.release();
                    assert!(scope.is_released());
                    assert!(matches!(
                        scope.get::<Node>(),
                        Err(ResolveError::ScopeReleased)
                    ));
                }
            }
            _ => {
                // The cycle must always be rejected, never looped.
                let error = root.get::<Cyclic>().unwrap_err();
                assert!(matches!(
                    error.root_cause(),
                    ResolveError::CircularDependency(_)
                ));
            }
        }
    }
});
