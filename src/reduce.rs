//! C4: the iterative full/bounded/chain reducer (§4.3).
//!
//! A single explicit worklist drives a post-order rebuild of the DAG rooted
//! at the call's argument: children are pushed before their parent, and the
//! parent is rebuilt once every child has produced a result on `arg_stack`.
//! This mirrors `egraph/elaborate.rs`'s explicit-stack elimination of what
//! would otherwise be a recursive descent over a graph that can be
//! thousands of nodes deep.

use crate::cache::BetaCache;
use crate::graph::{mk_args_in_order, mk_binary, ExprGraph, NodeKind, NodeRef};
use crate::param::ParamBindings;
use crate::scope::{Mark, ScopeStack};
use crate::stats::Stats;
use smallvec::SmallVec;

/// Which of the three traversal policies (§4.3 "Modes") drives this call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Mode {
    /// Unbounded expansion; populates the cross-call cache on apply
    /// completion.
    Full,
    /// Expand only chain lambdas and parameterized interior nodes.
    Chain,
    /// Stop expanding lambdas once the active scope depth reaches `bound`.
    Bounded(u32),
}

/// Run the full/bounded/chain reducer over `root` and return the rebuilt,
/// caller-owned node (§4.3, §6.2).
pub(crate) fn reduce<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    root: NodeRef,
    mode: Mode,
    mut cache: Option<&mut BetaCache>,
    stats: &mut Stats,
) -> NodeRef {
    let mut scope = ScopeStack::new();
    let mut work: Vec<(NodeRef, Option<NodeRef>)> = vec![(root, None)];
    let mut arg_stack: Vec<NodeRef> = Vec::new();

    while let Some((popped, parent)) = work.pop() {
        stats.node_visited += 1;

        // Constraint applies must not be simplified away; everything else
        // goes through the simplifier first (§4.3, "Per-node processing").
        let pre = popped.regular();
        let cur = if graph.is_constraint(pre) && graph.kind(pre) == NodeKind::Apply {
            popped.compose(graph.chase_forwarded(pre))
        } else {
            popped.compose(graph.simplify(pre))
        };
        let n = cur.regular();
        let id = n.id();

        match scope.mark(id) {
            None => {
                if graph.kind(n) == NodeKind::Lambda
                    && !graph.is_parameterized(n)
                    && !graph.is_nested_lambda(n)
                {
                    scope.open(id);
                    stats.scope_open += 1;
                }
                scope.set_mark(id, Mark::Expanded);

                let arity = graph.arity(n);
                let se: SmallVec<[NodeRef; 3]> =
                    (0..arity).map(|i| graph.simplify(graph.child(n, i))).collect();

                let bound_cut = matches!(mode, Mode::Bounded(bound)
                    if graph.kind(n) == NodeKind::Lambda && scope.call_depth() as u32 >= bound);
                let chain_cut = mode == Mode::Chain
                    && ((graph.kind(n) == NodeKind::Lambda && !graph.is_chain(n))
                        || (graph.kind(n) != NodeKind::Lambda && !graph.is_parameterized(n)));
                let trivial_cut = !graph.has_lambda_below(n) && !graph.is_parameterized(n);

                if bound_cut || chain_cut || trivial_cut {
                    let result = graph.copy(n);
                    finish(graph, &mut scope, bindings, stats, cur, n, result, &mut arg_stack);
                    continue;
                }

                if graph.kind(n) == NodeKind::Param {
                    let result = match bindings.current_binding(n) {
                        Some(bound_arg) => graph.copy(bound_arg),
                        None => graph.copy(n),
                    };
                    finish(graph, &mut scope, bindings, stats, cur, n, result, &mut arg_stack);
                    continue;
                }

                if graph.kind(n) == NodeKind::Lambda {
                    if let Some(p) = parent {
                        let param = graph.child(n, 0);
                        if graph.kind(p) == NodeKind::Apply
                            && !arg_stack.is_empty()
                            && !bindings.is_bound(param)
                        {
                            let args_node = *arg_stack.last().expect("checked non-empty above");
                            if mode == Mode::Full {
                                if let Some(hit) =
                                    cache.as_deref().and_then(|c| c.lookup(n, args_node))
                                {
                                    stats.cache_hit += 1;
                                    #[cfg(feature = "trace-log")]
                                    log::trace!("beta_reduce: apply of {:?} hit cross-call cache -> {:?}", n, hit);
                                    let result = graph.copy(hit);
                                    finish(graph, &mut scope, bindings, stats, cur, n, result, &mut arg_stack);
                                    continue;
                                }
                                stats.cache_miss += 1;
                            }
                            bindings.assign_args(graph, n, args_node);
                            stats.param_assign += 1;
                        }
                    }
                }

                work.push((cur, parent));
                for &child in se.iter() {
                    work.push((child, Some(n)));
                }
            }

            Some(Mark::Expanded) => {
                let arity = graph.arity(n) as usize;
                let mut e: SmallVec<[Option<NodeRef>; 3]> = SmallVec::new();
                e.resize(arity, None);
                for k in 0..arity {
                    let v = arg_stack.pop().expect("arity children were pushed for this node");
                    e[arity - 1 - k] = Some(v);
                }
                let e: SmallVec<[NodeRef; 3]> = e.into_iter().map(|v| v.expect("all slots filled")).collect();

                let kind = graph.kind(n);
                let result = match kind {
                    NodeKind::BvConst | NodeKind::BvVar | NodeKind::ArrayVar | NodeKind::Param => {
                        graph.copy(n)
                    }
                    NodeKind::Slice => {
                        let (upper, lower) = graph.slice_bounds(n);
                        graph.mk_slice(e[0], upper, lower)
                    }
                    k if k.is_binary_arith() => mk_binary(graph, k, e[1], e[0]),
                    NodeKind::Args => {
                        let forward = args_forward(&e);
                        mk_args_in_order(graph, &forward)
                    }
                    NodeKind::Apply => {
                        let fun = e[1];
                        let args = e[0];
                        let result = if graph.kind(fun.regular()) != NodeKind::Lambda {
                            graph.copy(fun)
                        } else {
                            graph.mk_apply(fun, args)
                        };
                        if mode == Mode::Full {
                            let orig_fn_child = graph.child(n, 0);
                            if graph.kind(orig_fn_child) == NodeKind::Lambda
                                && !graph.is_parameterized(orig_fn_child)
                            {
                                if let Some(c) = cache.as_deref_mut() {
                                    let lam_key = graph.simplify(orig_fn_child);
                                    let args_key = graph.simplify(args);
                                    c.store(graph, lam_key, args_key, result);
                                }
                            }
                        }
                        result
                    }
                    NodeKind::Lambda => {
                        if graph.child(n, 0) == e[1]
                            && graph.child(n, 1) == e[0]
                            && graph.is_parameterized(e[0])
                        {
                            graph.copy(n)
                        } else {
                            graph.copy(e[0])
                        }
                    }
                    NodeKind::BvCond | NodeKind::ArrayCond => graph.mk_ite(e[2], e[1], e[0]),
                };
                #[cfg(feature = "trace-log")]
                log::trace!("beta_reduce: rebuilt {:?} node {:?} -> {:?}", kind, n, result);
                stats.node_rebuilt += 1;
                for &child in e.iter() {
                    graph.release(child);
                }
                finish(graph, &mut scope, bindings, stats, cur, n, result, &mut arg_stack);
            }

            Some(Mark::Done) => {
                let result = if graph.is_parameterized(n) {
                    graph.copy(
                        scope
                            .cached_result(id)
                            .expect("parameterized node marked done has a scope result"),
                    )
                } else {
                    graph.copy(n)
                };
                arg_stack.push(cur.compose(result));
            }
        }
    }

    debug_assert_eq!(arg_stack.len(), 1, "full reduction must leave exactly one result");
    arg_stack.pop().expect("checked length above")
}

/// `BETA_REDUCE_PUSH_ARG_STACK`: promote the mark to done, store a
/// scope-local memo entry for parameterized nodes, close the scope if `n`
/// is its head, unassign parameters where owed, and finally push the
/// inversion-composed `result` onto `arg_stack` (§4.3).
fn finish<G: ExprGraph>(
    graph: &mut G,
    scope: &mut ScopeStack,
    bindings: &mut ParamBindings,
    stats: &mut Stats,
    cur: NodeRef,
    n: NodeRef,
    result: NodeRef,
    arg_stack: &mut Vec<NodeRef>,
) {
    let id = n.id();
    scope.set_mark(id, Mark::Done);

    if graph.is_parameterized(n) {
        scope.store_result(graph, id, result);
    }

    if scope.is_head(id) {
        scope.close(graph);
        stats.scope_close += 1;
        let param = graph.child(n, 0);
        if bindings.is_bound(param) {
            bindings.unassign(graph, n);
            stats.param_unassign += 1;
        }
    } else if graph.kind(n) == NodeKind::Lambda && !graph.is_nested_lambda(n) && graph.is_parameterized(n) {
        let param = graph.child(n, 0);
        if bindings.is_bound(param) {
            bindings.unassign(graph, n);
            stats.param_unassign += 1;
        }
    }

    arg_stack.push(cur.compose(result));
}

/// Reverse the pop-order children back to forward positional order for a
/// 1-3-ary args node (§4.3 rebuild table, "Args reversal" in §9).
fn args_forward(e: &[NodeRef]) -> SmallVec<[NodeRef; 3]> {
    match e.len() {
        1 => SmallVec::from_slice(&[e[0]]),
        2 => SmallVec::from_slice(&[e[1], e[0]]),
        3 => SmallVec::from_slice(&[e[2], e[1], e[0]]),
        _ => unreachable!("args node arity must be 1..=3"),
    }
}
