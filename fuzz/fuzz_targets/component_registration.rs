#![no_main]

use libfuzzer_sys::fuzz_target;
use wrought_di::{RegistryBuilder, Resolver, Sharing};

#[derive(Debug)]
struct Widget {
    id: u32,
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let pattern = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let mut builder = RegistryBuilder::new();

    // Register a fuzz-driven mix of sharings and qualifiers for one type.
    for (index, chunk) in data[4..].chunks(2).take(32).enumerate() {
        let id = index as u32;
        let sharing = match chunk[0] % 3 {
            0 => Sharing::Transient,
            1 => Sharing::Scoped,
            _ => Sharing::Root,
        };
        let qualified = chunk.get(1).copied().unwrap_or(0) % 2 == 0;
        let registration = builder
            .component::<Widget>()
            .sharing(sharing)
            .factory(move |_| Ok(Widget { id }));
        if qualified {
            registration.qualified("alt").register();
        } else {
            registration.register();
        }
    }

    let root = builder.build();

    // Whatever the mix, resolution must not panic and sequences must agree
    // with single-result precedence.
    if pattern % 2 == 0 {
        let all = root.get_sequence::<Widget>().unwrap();
        if let Ok(last) = root.get::<Widget>() {
            let tail = all.last().expect("non-empty sequence has a last element");
            assert_eq!(tail.id, last.id);
        } else {
            assert!(all.is_empty());
        }
    } else {
        let _ = root.get_qualified::<Widget>("alt");
        let _ = root.get_group::<Widget>();
    }
});
