//! Call-scoped counters (§8, modeled on `cranelift-codegen::egraph::Stats`).
//!
//! Every facade entry point has a `*_with_stats` variant (§6.2) that returns
//! one of these alongside the result. The plain variants just discard it.

/// Named event counters accumulated over the course of a single engine call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub node_visited: u64,
    pub node_rebuilt: u64,
    pub scope_open: u64,
    pub scope_close: u64,
    pub cache_hit: u64,
    pub cache_miss: u64,
    pub param_assign: u64,
    pub param_unassign: u64,
    pub partial_memo_hit: u64,
    pub partial_memo_miss: u64,
    pub partial_ite_resolved: u64,
    pub partial_ite_undetermined: u64,
}
