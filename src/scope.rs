//! C2: the scope stack (§3 "Scope", §4.3 step 1 / "Emit to arg stack").
//!
//! A scope is opened when the full/bounded/chain reducer first touches an
//! unparameterized lambda that is either not part of a nested chain or is
//! the head of one, and is closed when that same lambda is popped back to
//! the `arg_stack`. Scopes nest by lambda, not by block or dominator depth,
//! so (unlike `elaborate.rs`'s `ScopedHashMap`, which is keyed purely by
//! depth) we keep an explicit stack of table pairs rather than one table
//! with depth-stamped entries.

use crate::graph::{NodeId, NodeRef};
use fxhash::FxHashMap;

/// Visitation state of a node within the current scope (§4.3). A node with
/// no mark yet is implicitly "unseen" — the reducer's worklist loop uses
/// `Option<Mark>` rather than a third variant for that state, since nothing
/// ever needs to distinguish "unseen" from "mid-expansion" except by whether
/// an entry exists at all.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Mark {
    /// Children have been pushed onto the worklist; the next pop of this
    /// node rebuilds it from their results.
    Expanded,
    /// Fully rebuilt; a revisit within this scope clones the cached result.
    Done,
}

pub(crate) struct Scope {
    marks: FxHashMap<NodeId, Mark>,
    results: FxHashMap<NodeId, NodeRef>,
    /// The lambda this scope was opened for; `None` for the outermost call
    /// scope, which never closes as an ordinary lambda scope does.
    head: Option<NodeId>,
}

impl Scope {
    fn new(head: Option<NodeId>) -> Self {
        Scope {
            marks: FxHashMap::default(),
            results: FxHashMap::default(),
            head,
        }
    }
}

/// The stack of active scopes, innermost (currently-open) scope last.
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::new(None)],
        }
    }

    /// Open a new scope keyed on `head`, becoming the active one.
    pub(crate) fn open(&mut self, head: NodeId) {
        #[cfg(feature = "trace-log")]
        log::trace!("beta_reduce: opening scope for lambda {:?} (depth {})", head, self.scopes.len());
        self.scopes.push(Scope::new(Some(head)));
    }

    fn active(&self) -> &Scope {
        self.scopes.last().expect("scope stack must never be empty mid-call")
    }

    fn active_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack must never be empty mid-call")
    }

    pub(crate) fn mark(&self, n: NodeId) -> Option<Mark> {
        self.active().marks.get(&n).copied()
    }

    pub(crate) fn set_mark(&mut self, n: NodeId, mark: Mark) {
        self.active_mut().marks.insert(n, mark);
    }

    /// Record `result` (an owned reference) as the rebuilt value of the
    /// parameterized node `n` in the currently-active scope (§4.3, "Emit to
    /// arg stack").
    pub(crate) fn store_result<G: crate::graph::ExprGraph>(&mut self, graph: &mut G, n: NodeId, result: NodeRef) {
        let owned = graph.copy(result);
        let prev = self.active_mut().results.insert(n, owned);
        debug_assert!(prev.is_none(), "node rebuilt twice within the same scope");
    }

    pub(crate) fn cached_result(&self, n: NodeId) -> Option<NodeRef> {
        self.active().results.get(&n).copied()
    }

    pub(crate) fn is_head(&self, n: NodeId) -> bool {
        self.active().head == Some(n)
    }

    /// Whether any scope is currently open (i.e. we are nested below the
    /// outermost call scope). Used to detect first-vs-nested lambdas.
    pub(crate) fn is_open(&self) -> bool {
        self.scopes.len() > 1
    }

    /// Close the currently-active scope: release every stored result and
    /// pop the suspended scope beneath it (§3 invariant 3, §4.3).
    pub(crate) fn close<G: crate::graph::ExprGraph>(&mut self, graph: &mut G) {
        let scope = self.scopes.pop().expect("closing an empty scope stack");
        #[cfg(feature = "trace-log")]
        log::trace!(
            "beta_reduce: closing scope for lambda {:?} ({} memoized results)",
            scope.head,
            scope.results.len()
        );
        for (_, result) in scope.results {
            graph.release(result);
        }
        debug_assert!(!self.scopes.is_empty(), "must not close the outermost call scope");
    }

    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Number of lambda scopes opened beyond the outermost call scope
    /// (§4.3 Modes, "Bounded": compared against `bound`).
    pub(crate) fn call_depth(&self) -> usize {
        self.scopes.len() - 1
    }
}
