//! C5: the partial reducer (§4.5).
//!
//! Unlike the full/bounded/chain reducer, partial reduction evaluates
//! Boolean conditionals against the currently-bound parameters (via the
//! host's `evaluate_to_const`) and rebuilds only the chosen branch. It is
//! driven by the same explicit-worklist shape as `reduce.rs`, but marks
//! visit state on the node itself (`beta_mark`) rather than in a scope
//! table, and memoizes under a (node, active-binding-snapshot) tuple
//! instead of per-scope node identity, since a caller may re-enter the same
//! shared subterm under a different model.

use crate::graph::{mk_binary, ExprGraph, NodeId, NodeKind, NodeRef};
use crate::param::ParamBindings;
use crate::stats::Stats;
use fxhash::FxHashMap;
use smallvec::SmallVec;

/// A hashable (node, current free-parameter bindings) key — the
/// "parameter-cache tuple" of the GLOSSARY. See [`ParamBindings::snapshot`]
/// for why this uses the full active-binding set rather than a precise
/// free-variable set.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ParamCacheKey {
    node: NodeId,
    bindings: SmallVec<[(NodeId, NodeRef); 8]>,
}

fn cache_key(n: NodeRef, bindings: &ParamBindings) -> ParamCacheKey {
    ParamCacheKey {
        node: n.id(),
        bindings: bindings.snapshot(),
    }
}

/// For a lambda revisited at `beta_mark == 2`, the cache key must reflect
/// the binding it would have under the args currently atop `arg_stack` —
/// so we assign, compute the key, and unassign again, matching the
/// original's temporary `btor_assign_args`/`btor_unassign_params` pair at
/// `BETA_REDUCE_PARTIAL_START`'s mark-2 site.
fn mark2_key<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    n: NodeRef,
    arg_stack: &[NodeRef],
) -> ParamCacheKey {
    if graph.kind(n) == NodeKind::Lambda {
        let args_node = *arg_stack.last().expect("lambda revisit requires args on the stack");
        bindings.assign_args(graph, n, args_node);
        let key = cache_key(n, bindings);
        bindings.unassign(graph, n);
        key
    } else {
        cache_key(n, bindings)
    }
}

/// A caller-owned table mapping an ITE condition's parameter-cache tuple to
/// the condition node itself (§4.5, "collection table"). `partial_collect`
/// takes one for the `'1'` branch and one for the `'0'` branch; the first
/// write for a given tuple wins.
#[derive(Default)]
pub struct SelectorTable {
    entries: FxHashMap<ParamCacheKey, NodeRef>,
}

impl SelectorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The condition nodes recorded so far, in unspecified order.
    pub fn conditions(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.entries.values().copied()
    }
}

/// Run the partial reducer over `root` (§4.5) and return the rebuilt node
/// plus, if the caller wants it, the node responsible for any remaining
/// parameterization of the result.
pub(crate) fn partial_reduce<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    root: NodeRef,
    mut cond_sel1: Option<&mut SelectorTable>,
    mut cond_sel2: Option<&mut SelectorTable>,
    stats: &mut Stats,
) -> (NodeRef, Option<NodeRef>) {
    let root_regular = root.regular();
    if !graph.is_parameterized(root_regular) && graph.kind(root_regular) != NodeKind::Lambda {
        return (graph.copy(root), None);
    }

    // A bare lambda is never itself parameterized; the caller wants its
    // instantiated body (§4.5, precondition).
    let exp = if graph.kind(root_regular) == NodeKind::Lambda {
        graph.child(root_regular, 1)
    } else {
        root
    };

    let mut work: Vec<(NodeRef, Option<NodeRef>)> = vec![(exp, None)];
    let mut arg_stack: Vec<NodeRef> = Vec::new();
    let mut origin_stack: Vec<NodeRef> = Vec::new();
    let mut memo: FxHashMap<ParamCacheKey, (NodeRef, NodeRef)> = FxHashMap::default();

    while let Some((cur, parent)) = work.pop() {
        let n = cur.regular();
        match graph.beta_mark(n) {
            0 => start(
                graph,
                bindings,
                &mut work,
                &mut arg_stack,
                &mut origin_stack,
                cur,
                parent,
                cond_sel1.as_deref_mut(),
                cond_sel2.as_deref_mut(),
                stats,
            ),
            1 => rebuild(graph, bindings, &mut arg_stack, &mut origin_stack, &mut memo, cur, stats),
            _ => {
                let key = mark2_key(graph, bindings, n, &arg_stack);
                if let Some(&(res, origin)) = memo.get(&key) {
                    stats.partial_memo_hit += 1;
                    #[cfg(feature = "trace-log")]
                    log::trace!("beta_reduce: partial memo hit for {:?} -> {:?}", n, res);
                    arg_stack.push(cur.compose(graph.copy(res)));
                    origin_stack.push(origin);
                } else {
                    stats.partial_memo_miss += 1;
                    #[cfg(feature = "trace-log")]
                    log::trace!("beta_reduce: partial memo miss for {:?} under new bindings, restarting", n);
                    graph.set_beta_mark(n, 0);
                    start(
                        graph,
                        bindings,
                        &mut work,
                        &mut arg_stack,
                        &mut origin_stack,
                        cur,
                        parent,
                        cond_sel1.as_deref_mut(),
                        cond_sel2.as_deref_mut(),
                        stats,
                    );
                }
            }
        }
    }

    debug_assert_eq!(arg_stack.len(), 1);
    debug_assert_eq!(origin_stack.len(), 1);
    let result = arg_stack.pop().expect("checked length above");
    let origin = origin_stack.pop().expect("checked length above");
    let parameterized = if graph.is_parameterized(origin) {
        Some(origin)
    } else {
        None
    };

    for (key, (res, res_origin)) in memo.drain() {
        graph.set_beta_mark(NodeRef::from(key.node), 0);
        graph.release(res);
        graph.release(res_origin);
    }

    (result, parameterized)
}

/// Start (or restart, after a memo miss) processing `cur` (`beta_mark ==
/// 0`): §4.5's `BETA_REDUCE_PARTIAL_START`.
#[allow(clippy::too_many_arguments)]
fn start<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    work: &mut Vec<(NodeRef, Option<NodeRef>)>,
    arg_stack: &mut Vec<NodeRef>,
    origin_stack: &mut Vec<NodeRef>,
    cur: NodeRef,
    parent: Option<NodeRef>,
    cond_sel1: Option<&mut SelectorTable>,
    cond_sel2: Option<&mut SelectorTable>,
    stats: &mut Stats,
) {
    let n = cur.regular();

    if !graph.is_parameterized(n) {
        debug_assert!(
            graph.kind(n) == NodeKind::Args || graph.is_tseitin(n) || graph.kind(n) == NodeKind::Lambda,
            "beta_reduce: non-parameterized leaf reached by partial reduction has an unexpected kind"
        );
        arg_stack.push(graph.copy(cur));
        origin_stack.push(n);
        return;
    }

    if graph.kind(n) == NodeKind::Param {
        let bound = bindings
            .current_binding(n)
            .expect("partial reduction requires the caller to have pre-assigned parameter bindings");
        arg_stack.push(graph.copy(cur.compose(bound)));
        origin_stack.push(n);
        return;
    }

    if graph.kind(n) == NodeKind::BvCond {
        let cond = graph.child(n, 0);
        if let Some(bits) = graph.evaluate_to_const(cond) {
            stats.partial_ite_resolved += 1;
            let (branch_idx, table) = if bits.is_true() {
                (1, cond_sel1)
            } else {
                (2, cond_sel2)
            };
            #[cfg(feature = "trace-log")]
            log::trace!("beta_reduce: ITE {:?} resolved to branch {}", n, branch_idx);
            if let Some(table) = table {
                let key = cache_key(cond.regular(), bindings);
                table.entries.entry(key).or_insert(cond);
            }
            let branch = graph.child(n, branch_idx);
            work.push((cur.compose(branch), Some(n)));
            return;
        } else {
            stats.partial_ite_undetermined += 1;
            #[cfg(feature = "trace-log")]
            log::trace!("beta_reduce: ITE {:?} condition undetermined, falling through to generic rebuild", n);
            // Fall through to the generic rebuild path below.
        }
    }

    if graph.kind(n) == NodeKind::Lambda {
        if let Some(p) = parent {
            let param = graph.child(n, 0);
            if graph.kind(p) == NodeKind::Apply && !arg_stack.is_empty() && !bindings.is_bound(param) {
                let args_node = *arg_stack.last().expect("checked non-empty above");
                bindings.assign_args(graph, n, args_node);
                stats.param_assign += 1;
            }
        }
    }

    graph.set_beta_mark(n, 1);
    work.push((cur, parent));
    let arity = graph.arity(n);
    for i in 0..arity {
        work.push((graph.child(n, i), Some(n)));
    }
}

/// Rebuild `cur` (`beta_mark == 1`, all children produced): §4.5's
/// rebuild table, which mostly matches §4.3's but transfers ownership
/// directly through `apply`'s passthrough and `lambda`'s body instead of
/// cloning (partial reduction never preserves a lambda as a value).
fn rebuild<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    arg_stack: &mut Vec<NodeRef>,
    origin_stack: &mut Vec<NodeRef>,
    memo: &mut FxHashMap<ParamCacheKey, (NodeRef, NodeRef)>,
    cur: NodeRef,
    stats: &mut Stats,
) {
    let n = cur.regular();
    graph.set_beta_mark(n, 2);

    let arity = graph.arity(n) as usize;
    let mut e: SmallVec<[Option<NodeRef>; 3]> = SmallVec::new();
    let mut e_origin: SmallVec<[Option<NodeRef>; 3]> = SmallVec::new();
    e.resize(arity, None);
    e_origin.resize(arity, None);
    for k in 0..arity {
        let v = arg_stack.pop().expect("arity children were pushed for this node");
        let o = origin_stack.pop().expect("arity origins were pushed for this node");
        e[arity - 1 - k] = Some(v);
        e_origin[arity - 1 - k] = Some(o);
    }
    let e: SmallVec<[NodeRef; 3]> = e.into_iter().map(|v| v.expect("all slots filled")).collect();
    let e_origin: SmallVec<[NodeRef; 3]> =
        e_origin.into_iter().map(|v| v.expect("all slots filled")).collect();

    let kind = graph.kind(n);
    let (result, origin): (NodeRef, NodeRef) = match kind {
        NodeKind::Slice => {
            let (upper, lower) = graph.slice_bounds(n);
            let r = graph.mk_slice(e[0], upper, lower);
            graph.release(e[0]);
            (r, n)
        }
        k if k.is_binary_arith() => {
            let r = mk_binary(graph, k, e[1], e[0]);
            graph.release(e[0]);
            graph.release(e[1]);
            (r, n)
        }
        NodeKind::Args => {
            let forward = args_forward(&e);
            let r = graph.mk_args(&forward);
            for &c in e.iter() {
                graph.release(c);
            }
            (r, n)
        }
        NodeKind::Apply => {
            let fun = e[1];
            let args = e[0];
            if graph.kind(fun.regular()) == NodeKind::Lambda {
                let r = graph.mk_apply(fun, args);
                graph.release(fun);
                graph.release(args);
                (r, n)
            } else {
                // The function slot reduced to a value, not a function;
                // pass it through unchanged, tracking its own origin
                // rather than the apply node's (§4.5, rebuild table).
                graph.release(args);
                (fun, e_origin[1])
            }
        }
        NodeKind::Lambda => {
            // Partial reduction always substitutes a lambda by its
            // (already reduced) body; there is no "unchanged clone" case.
            let param_result = e[1];
            graph.release(param_result);
            (e[0], e_origin[0])
        }
        NodeKind::BvCond | NodeKind::ArrayCond => {
            let r = graph.mk_ite(e[2], e[1], e[0]);
            graph.release(e[0]);
            graph.release(e[1]);
            graph.release(e[2]);
            (r, n)
        }
        NodeKind::BvConst | NodeKind::BvVar | NodeKind::ArrayVar | NodeKind::Param => {
            unreachable!("leaves and parameters are resolved in start(), never reach rebuild()")
        }
    };

    let key = cache_key(n, bindings);
    debug_assert!(!memo.contains_key(&key), "node rebuilt twice under the same bindings");
    memo.insert(key, (graph.copy(result), graph.copy(origin)));

    if kind == NodeKind::Lambda {
        bindings.unassign(graph, n);
        stats.param_unassign += 1;
    }

    arg_stack.push(cur.compose(result));
    origin_stack.push(origin);
}

fn args_forward(e: &[NodeRef]) -> SmallVec<[NodeRef; 3]> {
    match e.len() {
        1 => SmallVec::from_slice(&[e[0]]),
        2 => SmallVec::from_slice(&[e[1], e[0]]),
        3 => SmallVec::from_slice(&[e[2], e[1], e[0]]),
        _ => unreachable!("args node arity must be 1..=3"),
    }
}
