//! C1: per-parameter binding stacks (§4.1).
//!
//! A stack, not a single slot, so a partial-reduction caller that re-enters a
//! lambda it is already inside (recursive re-entry) can push a second
//! binding without clobbering the first.

use crate::graph::{ExprGraph, NodeId, NodeRef};
use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;

#[derive(Clone, Default)]
struct BindingStack(SmallVec<[NodeRef; 4]>);

/// Owns every parameter's binding stack for the duration of an engine call
/// (or, for [`crate::facade::apply_and_reduce`], for the duration of the
/// explicit bind/reduce/unbind sequence).
#[derive(Default)]
pub struct ParamBindings {
    stacks: SecondaryMap<NodeId, BindingStack>,
    /// Parameters currently bound (non-empty stack), in assignment order.
    /// Used only to build the partial reducer's parameter-cache tuples
    /// (§4.5) without having to scan the whole `stacks` map.
    active: SmallVec<[NodeId; 8]>,
}

impl ParamBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `arg` onto `param`'s binding stack. Requires `width(arg) ==
    /// width(param)`; a mismatch is a contract violation (§7.1), not a
    /// recoverable error.
    pub fn assign<G: ExprGraph>(&mut self, graph: &G, param: NodeRef, arg: NodeRef) {
        debug_assert_eq!(
            graph.width(param),
            graph.width(arg),
            "beta_reduce: assign() requires matching parameter/argument width"
        );
        let stack = &mut self.stacks[param.id()].0;
        if stack.is_empty() {
            self.active.push(param.id());
        }
        stack.push(arg);
    }

    /// Zip the lambda chain rooted at `lambda_head` with the positional
    /// arguments of `args_node` and [`Self::assign`] each (§4.1).
    pub fn assign_args<G: ExprGraph>(&mut self, graph: &mut G, lambda_head: NodeRef, args_node: NodeRef) {
        let argc = graph.arity(args_node);
        let mut level = lambda_head;
        for i in 0..argc {
            debug_assert_eq!(graph.kind(level), crate::graph::NodeKind::Lambda);
            let param = graph.child(level, 0);
            let arg = graph.child(args_node, i);
            self.assign(graph, param, arg);
            let body = graph.child(level, 1);
            level = body;
        }
    }

    /// Pop one binding per chain level, stopping at the first level whose
    /// stack is already empty or that is no longer a lambda (§4.1).
    pub fn unassign<G: ExprGraph>(&mut self, graph: &G, lambda_head: NodeRef) {
        let mut level = lambda_head;
        loop {
            if graph.kind(level) != crate::graph::NodeKind::Lambda {
                break;
            }
            let param = graph.child(level, 0);
            let stack = &mut self.stacks[param.id()].0;
            if stack.is_empty() {
                break;
            }
            stack.pop();
            if stack.is_empty() {
                self.active.retain(|&id| id != param.id());
            }
            level = graph.child(level, 1);
        }
    }

    /// The top of `param`'s binding stack, if any (§4.1). `param` is taken
    /// by its regular (uninverted) identity; composing any inversion bit
    /// from the use site is the caller's job, done uniformly for every node
    /// kind at the `arg_stack` push step (§4.3).
    pub fn current_binding(&self, param: NodeRef) -> Option<NodeRef> {
        self.stacks.get(param.id()).and_then(|s| s.0.last().copied())
    }

    pub fn is_bound(&self, param: NodeRef) -> bool {
        self.stacks
            .get(param.id())
            .map(|s| !s.0.is_empty())
            .unwrap_or(false)
    }

    /// A snapshot of every currently-bound parameter and its current
    /// binding, sorted by parameter identity for a stable hash/equality.
    ///
    /// The partial reducer's memo is keyed on (node, binding snapshot) —
    /// the original's `BtorParamCacheTuple` (§4.5, GLOSSARY). We don't have
    /// per-node free-variable sets available from [`ExprGraph`], so we use
    /// the full set of currently-active bindings as a conservative
    /// over-approximation: it only ever splits the memo finer than the set
    /// of a node's actual free parameters, never coarser, so memoization
    /// stays sound (see DESIGN.md open question).
    pub(crate) fn snapshot(&self) -> SmallVec<[(NodeId, NodeRef); 8]> {
        let mut out: SmallVec<[(NodeId, NodeRef); 8]> = self
            .active
            .iter()
            .map(|&id| (id, self.stacks[id].0.last().copied().expect("active param has a binding")))
            .collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }
}
