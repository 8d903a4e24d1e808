//! Per-request resolve operation state.
//!
//! A [`ResolveOperation`] is the transitive closure of resolves spawned by
//! one top-level request. It owns the single cycle-detection stack shared by
//! all of them, and the pending-release ledger that makes partial
//! construction cleanup deterministic.

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::descriptor::{DescriptorId, ReleaseFn};
use crate::error::{ResolveError, ResolveResult};
use crate::key::ServiceKey;
use crate::scope::LifetimeScope;

struct Frame {
    name: &'static str,
    key: ServiceKey,
    descriptor: DescriptorId,
}

struct PendingRelease {
    scope: Arc<LifetimeScope>,
    hook: ReleaseFn,
    shared: bool,
}

#[derive(Default)]
struct OperationState {
    stack: SmallVec<[Frame; 8]>,
    pending: Vec<PendingRelease>,
}

/// State shared by every resolve spawned from one top-level request.
pub(crate) struct ResolveOperation {
    max_depth: usize,
    state: Mutex<OperationState>,
}

impl ResolveOperation {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            state: Mutex::new(OperationState::default()),
        }
    }

    /// Pushes a resolve frame, failing on a cycle or on runaway depth.
    ///
    /// A frame is a cycle when either its key or its descriptor is already
    /// on the stack; matching the descriptor as well keeps a component
    /// reachable under two keys from re-entering its own construction.
    pub(crate) fn enter(&self, key: &ServiceKey, descriptor: DescriptorId) -> ResolveResult<()> {
        let mut state = self.state.lock();
        if let Some(position) = state
            .stack
            .iter()
            .position(|frame| &frame.key == key || frame.descriptor == descriptor)
        {
            let mut path: Vec<&'static str> =
                state.stack[position..].iter().map(|frame| frame.name).collect();
            path.push(key.display_name());
            return Err(ResolveError::CircularDependency(path));
        }
        if state.stack.len() >= self.max_depth {
            return Err(ResolveError::DepthExceeded(state.stack.len()));
        }
        state.stack.push(Frame {
            name: key.display_name(),
            key: key.clone(),
            descriptor,
        });
        Ok(())
    }

    /// Pops the top frame. Must run on every exit path, success or failure.
    pub(crate) fn exit(&self) {
        self.state.lock().stack.pop();
    }

    /// Records a release hook created during this operation. Hooks reach
    /// scope disposer lists only when the operation finishes.
    pub(crate) fn push_pending(&self, scope: Arc<LifetimeScope>, hook: ReleaseFn, shared: bool) {
        self.state.lock().pending.push(PendingRelease {
            scope,
            hook,
            shared,
        });
    }

    /// Commits every pending release to its owning scope in creation order.
    ///
    /// If the requesting scope lost a race against `release()`, the ledger
    /// is abandoned instead and the caller observes the released-scope
    /// failure rather than a value from a half-torn-down scope.
    pub(crate) fn commit(&self, requesting: &LifetimeScope) -> ResolveResult<()> {
        let pending = std::mem::take(&mut self.state.lock().pending);
        if requesting.is_released() {
            abandon(pending);
            return Err(ResolveError::ScopeReleased);
        }
        for entry in pending {
            if let Err(hook) = entry.scope.try_enroll(entry.hook) {
                // The owning scope was released mid-operation; release the
                // instance immediately rather than leak it.
                hook();
            }
        }
        Ok(())
    }

    /// Rolls the ledger back after a failed top-level resolve.
    pub(crate) fn rollback(&self) {
        let pending = std::mem::take(&mut self.state.lock().pending);
        abandon(pending);
    }
}

/// Shared instances stay reachable through their scope caches, so their
/// hooks transfer to the owning scope; transient owned instances were never
/// handed to anyone and release immediately, in reverse creation order.
fn abandon(pending: Vec<PendingRelease>) {
    let mut transients = Vec::new();
    for entry in pending {
        if entry.shared {
            if let Err(hook) = entry.scope.try_enroll(entry.hook) {
                hook();
            }
        } else {
            transients.push(entry.hook);
        }
    }
    while let Some(hook) = transients.pop() {
        hook();
    }
}
