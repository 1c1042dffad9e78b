//! Iterative beta-reduction engine for a hash-consed bit-vector/array
//! expression DAG with lambda abstractions.
//!
//! The expression graph itself — node kinds, hash-consing, refcounting,
//! simplification, and the rewriting constructors — is an external
//! collaborator the host solver implements via [`ExprGraph`]; this crate only
//! ever talks to it through that trait. What lives here is the traversal: an
//! explicit-worklist post-order rebuild (mirroring `cranelift-codegen`'s
//! `egraph::elaborate` module) that substitutes lambda parameters by their
//! bound arguments, re-simplifies every rebuilt node, and memoizes results
//! both within a call (scope-local) and across calls (the cross-call cache).
//!
//! Six entry points cover the component's external surface (see
//! [`full`], [`chains`], [`bounded`], [`partial`], [`partial_collect`], and
//! [`apply_and_reduce`]); each has a `*_with_stats` sibling that also returns
//! a [`Stats`] snapshot of the call.

mod cache;
mod facade;
mod graph;
mod param;
mod partial;
mod reduce;
mod scope;
mod stats;
#[cfg(test)]
mod test_support;

pub use cache::BetaCache;
pub use facade::{
    apply_and_reduce, apply_and_reduce_with_stats, bounded, bounded_with_stats, chains,
    chains_with_stats, full, full_with_stats, partial, partial_collect, partial_collect_with_stats,
    partial_with_stats,
};
pub use graph::{ConstBits, ExprGraph, NodeId, NodeKind, NodeRef};
pub use param::ParamBindings;
pub use partial::SelectorTable;
pub use stats::Stats;
