//! The component registry: static descriptors plus dynamic sources.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::decorator::Decorator;
use crate::descriptor::ComponentDescriptor;
use crate::key::ServiceKey;
use crate::observer::Observers;
use crate::sources::RegistrationSource;

/// Default maximum resolve stack depth.
pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 100;

/// Runtime options fixed at composition time.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub(crate) max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_RESOLVE_DEPTH,
        }
    }
}

/// Holds static component descriptors and dynamic registration sources, and
/// resolves a service key to a ranked list of candidate descriptors.
///
/// Registries are immutable after build. A child scope created with
/// scope-local additions carries an overlay registry whose lookups walk the
/// parent chain first, so the overlay's own registrations take single-result
/// precedence while multi-result lookups see everything in registration
/// order.
///
/// Synthesis results from registration sources are cached per registry under
/// a first-non-empty-wins idempotent cache, so repeated lookups do not
/// re-synthesize and concurrent synthesizers converge on one cached result.
pub struct ComponentRegistry {
    parent: Option<Arc<ComponentRegistry>>,
    entries: HashMap<ServiceKey, Vec<Arc<ComponentDescriptor>>>,
    sources: Vec<Arc<dyn RegistrationSource>>,
    decorators: Vec<Decorator>,
    synthesized: RwLock<HashMap<ServiceKey, Arc<Vec<Arc<ComponentDescriptor>>>>>,
    observers: Observers,
    options: ResolveOptions,
}

impl ComponentRegistry {
    pub(crate) fn build(
        descriptors: Vec<ComponentDescriptor>,
        sources: Vec<Arc<dyn RegistrationSource>>,
        decorators: Vec<Decorator>,
        observers: Observers,
        options: ResolveOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent: None,
            entries: index(descriptors),
            sources,
            decorators,
            synthesized: RwLock::new(HashMap::new()),
            observers,
            options,
        })
    }

    pub(crate) fn overlay(
        parent: Arc<ComponentRegistry>,
        descriptors: Vec<ComponentDescriptor>,
        sources: Vec<Arc<dyn RegistrationSource>>,
        decorators: Vec<Decorator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent: Some(parent),
            entries: index(descriptors),
            sources,
            decorators,
            synthesized: RwLock::new(HashMap::new()),
            observers: Observers::new(),
            options: ResolveOptions::default(),
        })
    }

    /// Statically registered descriptors for a key, in registration order
    /// (parent chain first, most local last).
    pub fn registered(&self, key: &ServiceKey) -> Vec<Arc<ComponentDescriptor>> {
        let mut found = match &self.parent {
            Some(parent) => parent.registered(key),
            None => Vec::new(),
        };
        if let Some(own) = self.entries.get(key) {
            found.extend(own.iter().cloned());
        }
        found
    }

    /// Qualified registrations of an element type, in registration order.
    pub fn qualified_registrations(
        &self,
        element: TypeId,
    ) -> Vec<(&'static str, Arc<ComponentDescriptor>)> {
        let mut found = Vec::new();
        self.collect_qualified(element, &mut found);
        found.sort_by_key(|(_, descriptor)| descriptor.id());
        found
    }

    fn collect_qualified(
        &self,
        element: TypeId,
        found: &mut Vec<(&'static str, Arc<ComponentDescriptor>)>,
    ) {
        if let Some(parent) = &self.parent {
            parent.collect_qualified(element, found);
        }
        for (key, descriptors) in &self.entries {
            if let ServiceKey::Qualified(id, _, qualifier) = key {
                if *id == element {
                    found.extend(
                        descriptors
                            .iter()
                            .map(|descriptor| (*qualifier, descriptor.clone())),
                    );
                }
            }
        }
    }

    /// Candidate descriptors for a key: statically registered ones, or the
    /// cached synthesis of the first source that supplies the key.
    pub(crate) fn candidates(&self, key: &ServiceKey) -> Vec<Arc<ComponentDescriptor>> {
        let found = self.registered(key);
        if !found.is_empty() {
            return found;
        }
        if let Some(cached) = self.synthesized.read().get(key) {
            return cached.as_ref().clone();
        }
        let mut sources = Vec::new();
        self.collect_sources(&mut sources);
        for source in sources {
            if !source.can_supply(key) {
                continue;
            }
            let made = source.synthesize(key, self);
            if made.is_empty() {
                continue;
            }
            let mut cache = self.synthesized.write();
            let entry = cache
                .entry(key.clone())
                .or_insert_with(|| Arc::new(made));
            return entry.as_ref().clone();
        }
        Vec::new()
    }

    /// Sources in precedence order: most local registry first, then the
    /// parent chain (built-in sources sit last at the root).
    fn collect_sources<'a>(&'a self, sources: &mut Vec<&'a Arc<dyn RegistrationSource>>) {
        sources.extend(self.sources.iter());
        if let Some(parent) = &self.parent {
            parent.collect_sources(sources);
        }
    }

    /// Decorators applicable to a key, in registration order (parent chain
    /// first).
    pub(crate) fn decorators_for(&self, key: &ServiceKey) -> Vec<&Decorator> {
        let mut found = Vec::new();
        self.collect_decorators(key, &mut found);
        found
    }

    fn collect_decorators<'a>(&'a self, key: &ServiceKey, found: &mut Vec<&'a Decorator>) {
        if let Some(parent) = &self.parent {
            parent.collect_decorators(key, found);
        }
        found.extend(
            self.decorators
                .iter()
                .filter(|decorator| decorator.applies_to(key)),
        );
    }

    pub(crate) fn observers(&self) -> &Observers {
        match &self.parent {
            Some(parent) => parent.observers(),
            None => &self.observers,
        }
    }

    pub(crate) fn options(&self) -> &ResolveOptions {
        match &self.parent {
            Some(parent) => parent.options(),
            None => &self.options,
        }
    }
}

fn index(
    descriptors: Vec<ComponentDescriptor>,
) -> HashMap<ServiceKey, Vec<Arc<ComponentDescriptor>>> {
    let mut entries: HashMap<ServiceKey, Vec<Arc<ComponentDescriptor>>> = HashMap::new();
    for descriptor in descriptors {
        let descriptor = Arc::new(descriptor);
        for key in descriptor.keys() {
            entries
                .entry(key.clone())
                .or_default()
                .push(descriptor.clone());
        }
    }
    entries
}
