//! C3: the cross-call cache (§4.4, "Cross-call cache").
//!
//! Unlike the scope tables in `scope.rs`, which live and die with a single
//! engine entry point call, this cache survives across calls: it is owned by
//! the caller and threaded into every [`crate::facade::full`] /
//! [`crate::facade::apply_and_reduce`] invocation, the same way a
//! `cranelift-egraph` `Rules` table's built-in memoization persists across
//! `elaborate` calls within one compilation.

use crate::graph::{ExprGraph, NodeRef};
use fxhash::FxHashMap;

/// `(lambda head, args tuple) -> already-reduced result`, populated only by
/// the full reducer (never bounded/chain/partial, since those modes produce
/// results that depend on a caller-local bound or binding snapshot and are
/// not safe to share across calls, §4.4).
#[derive(Default)]
pub struct BetaCache {
    entries: FxHashMap<(NodeRef, NodeRef), NodeRef>,
}

impl BetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, lambda: NodeRef, args: NodeRef) -> Option<NodeRef> {
        let hit = self.entries.get(&(lambda, args)).copied();
        #[cfg(feature = "trace-log")]
        log::trace!("beta_reduce: cross-call cache {} for ({:?}, {:?})", if hit.is_some() { "hit" } else { "miss" }, lambda, args);
        hit
    }

    /// Record `result` for `(lambda, args)`. If an entry already exists it
    /// must be identical — hash-consing guarantees the same input always
    /// reduces to the same output, so a mismatch is a contract violation
    /// elsewhere in the engine, not a cache eviction decision.
    pub fn store<G: ExprGraph>(&mut self, graph: &mut G, lambda: NodeRef, args: NodeRef, result: NodeRef) {
        let owned = graph.copy(result);
        if let Some(&existing) = self.entries.get(&(lambda, args)) {
            debug_assert_eq!(existing, owned, "beta cache collision: same (lambda, args) reduced differently");
            graph.release(owned);
            return;
        }
        #[cfg(feature = "trace-log")]
        log::trace!("beta_reduce: cross-call cache store ({:?}, {:?}) -> {:?}", lambda, args, owned);
        self.entries.insert((lambda, args), owned);
    }

    /// Release every cached result and drop all entries. Call when the
    /// owning solver context is being torn down.
    pub fn clear<G: ExprGraph>(&mut self, graph: &mut G) {
        for (_, result) in self.entries.drain() {
            graph.release(result);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
