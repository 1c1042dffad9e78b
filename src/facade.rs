//! C6: the public entry points (§6.2).
//!
//! Thin wrappers over `reduce::reduce` and `partial::partial_reduce` that
//! own the per-call [`ParamBindings`]/[`Stats`] scaffolding so callers never
//! touch the internal components directly, mirroring how `btorbeta.c`'s
//! `btor_beta_reduce_full`/`_chains`/`_bounded`/`_partial`/`_partial_collect`
//! are thin wrappers over one shared `btor_beta_reduce_partial_aux`/
//! `btor_beta_reduce` core.

use crate::cache::BetaCache;
use crate::graph::{ExprGraph, NodeRef};
use crate::param::ParamBindings;
use crate::partial::{self, SelectorTable};
use crate::reduce::{self, Mode};
use crate::stats::Stats;

/// §4.3, mode=FULL, bound=0. Populates `cache` on apply completion and
/// consults it on lambda application.
pub fn full<G: ExprGraph>(graph: &mut G, cache: &mut BetaCache, exp: NodeRef) -> NodeRef {
    let (result, _) = full_with_stats(graph, cache, exp);
    result
}

pub fn full_with_stats<G: ExprGraph>(graph: &mut G, cache: &mut BetaCache, exp: NodeRef) -> (NodeRef, Stats) {
    let mut bindings = ParamBindings::new();
    let mut stats = Stats::default();
    let result = reduce::reduce(graph, &mut bindings, exp, Mode::Full, Some(cache), &mut stats);
    (result, stats)
}

/// §4.3, mode=CHAIN: expand only chain lambdas and parameterized interior
/// nodes, cloning everything else.
pub fn chains<G: ExprGraph>(graph: &mut G, exp: NodeRef) -> NodeRef {
    let (result, _) = chains_with_stats(graph, exp);
    result
}

pub fn chains_with_stats<G: ExprGraph>(graph: &mut G, exp: NodeRef) -> (NodeRef, Stats) {
    let mut bindings = ParamBindings::new();
    let mut stats = Stats::default();
    let result = reduce::reduce(graph, &mut bindings, exp, Mode::Chain, None, &mut stats);
    (result, stats)
}

/// §4.3, mode=BOUNDED: halt lambda expansion once scope depth reaches
/// `bound`. `bound` must be positive (a contract violation otherwise, §7.1).
pub fn bounded<G: ExprGraph>(graph: &mut G, exp: NodeRef, bound: u32) -> NodeRef {
    let (result, _) = bounded_with_stats(graph, exp, bound);
    result
}

pub fn bounded_with_stats<G: ExprGraph>(graph: &mut G, exp: NodeRef, bound: u32) -> (NodeRef, Stats) {
    debug_assert!(bound >= 1, "beta_reduce: bounded() requires bound >= 1");
    let mut bindings = ParamBindings::new();
    let mut stats = Stats::default();
    let result = reduce::reduce(graph, &mut bindings, exp, Mode::Bounded(bound), None, &mut stats);
    (result, stats)
}

/// §4.5 without conditional collection. The caller's parameters must
/// already have bindings assigned. Returns the rebuilt node and, if
/// requested, the subterm responsible for any remaining parameterization.
pub fn partial<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    exp: NodeRef,
) -> (NodeRef, Option<NodeRef>) {
    let (result, origin, _) = partial_with_stats(graph, bindings, exp);
    (result, origin)
}

pub fn partial_with_stats<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    exp: NodeRef,
) -> (NodeRef, Option<NodeRef>, Stats) {
    let mut stats = Stats::default();
    let (result, origin) = partial::partial_reduce(graph, bindings, exp, None, None, &mut stats);
    (result, origin, stats)
}

/// §4.5 populating two caller-owned collection tables: `sel_true` records
/// the condition of every ITE resolved to its `then` branch, `sel_false`
/// the condition of every ITE resolved to its `else` branch. First write
/// per parameter-cache tuple wins.
pub fn partial_collect<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    exp: NodeRef,
    sel_true: &mut SelectorTable,
    sel_false: &mut SelectorTable,
) -> NodeRef {
    let (result, _) = partial_collect_with_stats(graph, bindings, exp, sel_true, sel_false);
    result
}

pub fn partial_collect_with_stats<G: ExprGraph>(
    graph: &mut G,
    bindings: &mut ParamBindings,
    exp: NodeRef,
    sel_true: &mut SelectorTable,
    sel_false: &mut SelectorTable,
) -> (NodeRef, Stats) {
    let mut stats = Stats::default();
    let (result, _) =
        partial::partial_reduce(graph, bindings, exp, Some(sel_true), Some(sel_false), &mut stats);
    (result, stats)
}

/// §4.4: bind `args` onto successive levels of the lambda chain rooted at
/// `lambda_head`, fully reduce, then unbind — in that order, so the
/// bindings are visible to the reducer's auto-assignment logic exactly as
/// if `lambda_head` had been applied to `args` by an enclosing `apply` node.
/// `args.is_empty()` is legal and degenerates to `full(lambda_head)`.
pub fn apply_and_reduce<G: ExprGraph>(
    graph: &mut G,
    cache: &mut BetaCache,
    lambda_head: NodeRef,
    args: &[NodeRef],
) -> NodeRef {
    let (result, _) = apply_and_reduce_with_stats(graph, cache, lambda_head, args);
    result
}

pub fn apply_and_reduce_with_stats<G: ExprGraph>(
    graph: &mut G,
    cache: &mut BetaCache,
    lambda_head: NodeRef,
    args: &[NodeRef],
) -> (NodeRef, Stats) {
    let mut bindings = ParamBindings::new();
    let mut stats = Stats::default();

    let mut level = lambda_head;
    let mut unassign_stack = Vec::with_capacity(args.len());
    for &arg in args {
        debug_assert_eq!(
            graph.kind(level),
            crate::graph::NodeKind::Lambda,
            "beta_reduce: apply_and_reduce() has more arguments than lambda levels"
        );
        let param = graph.child(level, 0);
        bindings.assign(graph, param, arg);
        stats.param_assign += 1;
        unassign_stack.push(level);
        level = graph.child(level, 1);
    }

    let result = reduce::reduce(graph, &mut bindings, lambda_head, Mode::Full, Some(cache), &mut stats);

    while let Some(level) = unassign_stack.pop() {
        bindings.unassign(graph, level);
        stats.param_unassign += 1;
    }

    (result, stats)
}
