//! The resolve pipeline: an ordered middleware chain run per request.
//!
//! Stage order is fixed: cycle guard, sharing selection, disposal
//! enrollment, decorator application, activation. Enrollment and decoration
//! do their work on the unwind, so the observable order per constructed
//! instance is activate, decorate, enroll, cache. Each stage may
//! short-circuit with a cached instance; state mutation is confined to the
//! current operation and the single owning scope.

use std::sync::Arc;
use std::time::Instant;

use crate::activator::Parameters;
use crate::context::ActivationContext;
use crate::descriptor::{AnyHandle, ComponentDescriptor};
use crate::error::{ResolveError, ResolveResult};
use crate::key::ServiceKey;
use crate::operation::ResolveOperation;
use crate::scope::LifetimeScope;
use crate::sharing::{Ownership, Sharing};

/// One service request travelling through the stage chain.
pub(crate) struct ResolveRequest<'a> {
    pub(crate) key: &'a ServiceKey,
    pub(crate) descriptor: &'a Arc<ComponentDescriptor>,
    pub(crate) scope: &'a Arc<LifetimeScope>,
    pub(crate) operation: &'a ResolveOperation,
    pub(crate) parameters: &'a Parameters,
}

trait ResolveStage: Send + Sync {
    fn handle(&self, req: &ResolveRequest<'_>, next: Next<'_>) -> ResolveResult<AnyHandle>;
}

/// Continuation into the remaining stages.
#[derive(Clone, Copy)]
struct Next<'a> {
    stages: &'a [&'static dyn ResolveStage],
}

impl<'a> Next<'a> {
    fn proceed(self, req: &ResolveRequest<'_>) -> ResolveResult<AnyHandle> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(req, Next { stages: rest }),
            None => Err(ResolveError::activation("resolve pipeline exhausted")),
        }
    }
}

static STAGES: [&dyn ResolveStage; 5] = [
    &CycleGuard,
    &SharingSelect,
    &DisposalEnroll,
    &DecoratorApply,
    &Activate,
];

/// Resolves a key against a scope: candidate lookup, then the stage chain.
pub(crate) fn resolve_key(
    scope: &Arc<LifetimeScope>,
    key: &ServiceKey,
    parameters: &Parameters,
    operation: &ResolveOperation,
) -> ResolveResult<AnyHandle> {
    if scope.is_released() {
        return Err(ResolveError::ScopeReleased);
    }
    let candidates = scope.registry().candidates(key);
    // Later registrations take single-result precedence.
    match candidates.last() {
        Some(descriptor) => resolve_descriptor(scope, key, descriptor, parameters, operation),
        None => Err(ResolveError::NotRegistered(key.display_name())),
    }
}

/// Runs one specific descriptor through the stage chain.
pub(crate) fn resolve_descriptor(
    scope: &Arc<LifetimeScope>,
    key: &ServiceKey,
    descriptor: &Arc<ComponentDescriptor>,
    parameters: &Parameters,
    operation: &ResolveOperation,
) -> ResolveResult<AnyHandle> {
    let req = ResolveRequest {
        key,
        descriptor,
        scope,
        operation,
        parameters,
    };
    let observers = scope.registry().observers();
    if observers.is_empty() {
        return Next { stages: &STAGES }.proceed(&req);
    }
    observers.resolving(key);
    let start = Instant::now();
    let result = Next { stages: &STAGES }.proceed(&req);
    match &result {
        Ok(_) => observers.resolved(key, start.elapsed()),
        Err(error) => observers.resolve_failed(key, error),
    }
    result
}

/// The scope whose cache and disposer list own instances of this request.
fn owning_scope(req: &ResolveRequest<'_>) -> ResolveResult<Arc<LifetimeScope>> {
    match req.descriptor.sharing() {
        Sharing::Root => req.scope.root_scope(),
        _ => Ok(req.scope.clone()),
    }
}

/// Stage 1: push the key on the operation's stack; pop on every exit path.
struct CycleGuard;

impl ResolveStage for CycleGuard {
    fn handle(&self, req: &ResolveRequest<'_>, next: Next<'_>) -> ResolveResult<AnyHandle> {
        req.operation.enter(req.key, req.descriptor.id())?;
        let result = next.proceed(req);
        req.operation.exit();
        result
    }
}

/// Stage 2: pick the owning scope per sharing mode and consult its cache.
/// Creation is serialized per (scope, descriptor); the first successful
/// creator wins and all racers observe the identical instance.
struct SharingSelect;

impl ResolveStage for SharingSelect {
    fn handle(&self, req: &ResolveRequest<'_>, next: Next<'_>) -> ResolveResult<AnyHandle> {
        match req.descriptor.sharing() {
            Sharing::Transient => next.proceed(req),
            Sharing::Scoped => req
                .scope
                .get_or_create(req.descriptor.id(), || next.proceed(req)),
            Sharing::Root => {
                let root = req.scope.root_scope()?;
                root.get_or_create(req.descriptor.id(), || next.proceed(req))
            }
        }
    }
}

/// Stage 3: record a release hook for owned instances that expose one. Runs
/// on the unwind, so the enrolled instance is the decorated one, and only
/// actual constructions (not cache hits) enroll.
struct DisposalEnroll;

impl ResolveStage for DisposalEnroll {
    fn handle(&self, req: &ResolveRequest<'_>, next: Next<'_>) -> ResolveResult<AnyHandle> {
        let value = next.proceed(req)?;
        if req.descriptor.ownership() == Ownership::Owned {
            if let Some(hook) = req.descriptor.release_for(&value) {
                let owning = owning_scope(req)?;
                let shared = req.descriptor.sharing() != Sharing::Transient;
                req.operation.push_pending(owning, hook, shared);
            }
        }
        Ok(value)
    }
}

/// Stage 4: apply registered decorators innermost-first in registration
/// order; the decorator registered last ends up outermost.
struct DecoratorApply;

impl ResolveStage for DecoratorApply {
    fn handle(&self, req: &ResolveRequest<'_>, next: Next<'_>) -> ResolveResult<AnyHandle> {
        let mut value = next.proceed(req)?;
        let registry = req.scope.registry();
        let decorators = registry.decorators_for(req.key);
        if decorators.is_empty() {
            return Ok(value);
        }
        let ctx = ActivationContext::new(req.scope, req.operation, req.parameters);
        for decorator in decorators {
            value = decorator.apply(value, &ctx)?;
        }
        Ok(value)
    }
}

/// Stage 5: delegate to the descriptor's activator; failures are wrapped
/// with this frame's key so the top-level error carries the full path.
struct Activate;

impl ResolveStage for Activate {
    fn handle(&self, req: &ResolveRequest<'_>, _next: Next<'_>) -> ResolveResult<AnyHandle> {
        let ctx = ActivationContext::new(req.scope, req.operation, req.parameters);
        req.descriptor
            .activator()
            .activate(&ctx, req.key.display_name())
            .map_err(|error| error.in_context(req.key.display_name()))
    }
}
