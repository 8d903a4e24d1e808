//! Disposer list with LIFO execution order.

use crate::descriptor::ReleaseFn;

/// Append-only list of release hooks, drained last-in first-out.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<ReleaseFn>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, hook: ReleaseFn) {
        self.hooks.push(hook);
    }

    /// Runs all hooks in reverse creation order.
    pub(crate) fn run_reverse(&mut self) {
        while let Some(hook) = self.hooks.pop() {
            hook();
        }
    }
}
