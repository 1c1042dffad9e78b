//! Minimal in-crate graph fixture for component-level unit tests (§10).
//!
//! Unlike `tests/support`'s full reference graph, this one only implements
//! what `param.rs`/`scope.rs`/`cache.rs` unit tests actually exercise —
//! everything else panics loudly rather than faking a plausible value.

#![cfg(test)]

use crate::graph::{ConstBits, ExprGraph, NodeId, NodeKind, NodeRef};

#[derive(Default)]
pub(crate) struct MiniGraph {
    kinds: Vec<NodeKind>,
    widths: Vec<u32>,
    children: Vec<Vec<NodeRef>>,
    refcounts: Vec<u32>,
}

impl MiniGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, kind: NodeKind, width: u32, children: Vec<NodeRef>) -> NodeRef {
        self.kinds.push(kind);
        self.widths.push(width);
        self.children.push(children);
        self.refcounts.push(1);
        NodeRef::new(NodeId::new(self.kinds.len() - 1), false)
    }

    pub(crate) fn leaf(&mut self, kind: NodeKind, width: u32) -> NodeRef {
        self.push(kind, width, Vec::new())
    }

    pub(crate) fn lambda(&mut self, param: NodeRef, body: NodeRef) -> NodeRef {
        let width = self.widths[body.id().index()];
        self.push(NodeKind::Lambda, width, vec![param, body])
    }

    pub(crate) fn refcount(&self, n: NodeRef) -> u32 {
        self.refcounts[n.id().index()]
    }
}

impl ExprGraph for MiniGraph {
    fn kind(&self, n: NodeRef) -> NodeKind {
        self.kinds[n.id().index()]
    }

    fn arity(&self, n: NodeRef) -> u8 {
        self.children[n.id().index()].len() as u8
    }

    fn child(&self, n: NodeRef, i: u8) -> NodeRef {
        self.children[n.id().index()][i as usize]
    }

    fn width(&self, n: NodeRef) -> u32 {
        self.widths[n.id().index()]
    }

    fn slice_bounds(&self, _n: NodeRef) -> (u32, u32) {
        unimplemented!("not exercised by these unit tests")
    }

    fn is_parameterized(&self, n: NodeRef) -> bool {
        self.kinds[n.id().index()] == NodeKind::Param
    }

    fn has_lambda_below(&self, _n: NodeRef) -> bool {
        false
    }

    fn is_chain(&self, _n: NodeRef) -> bool {
        false
    }

    fn is_constraint(&self, _n: NodeRef) -> bool {
        false
    }

    fn is_tseitin(&self, _n: NodeRef) -> bool {
        false
    }

    fn is_nested_lambda(&self, _n: NodeRef) -> bool {
        false
    }

    fn copy(&mut self, n: NodeRef) -> NodeRef {
        self.refcounts[n.id().index()] += 1;
        n
    }

    fn release(&mut self, n: NodeRef) {
        let rc = &mut self.refcounts[n.id().index()];
        debug_assert!(*rc > 0, "release of a node with no outstanding references");
        *rc -= 1;
    }

    fn beta_mark(&self, _n: NodeRef) -> u8 {
        unimplemented!("beta_mark is partial-reduction-only; not exercised here")
    }

    fn set_beta_mark(&mut self, _n: NodeRef, _mark: u8) {
        unimplemented!("beta_mark is partial-reduction-only; not exercised here")
    }

    fn simplify(&mut self, n: NodeRef) -> NodeRef {
        n
    }

    fn chase_forwarded(&mut self, n: NodeRef) -> NodeRef {
        n
    }

    fn evaluate_to_const(&mut self, _n: NodeRef) -> Option<ConstBits> {
        unimplemented!("evaluate_to_const is partial-reduction-only; not exercised here")
    }

    fn mk_slice(&mut self, _a: NodeRef, _upper: u32, _lower: u32) -> NodeRef {
        unimplemented!()
    }
    fn mk_and(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_eq(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_add(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_mul(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_ult(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_sll(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_srl(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_udiv(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_urem(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_concat(&mut self, _a: NodeRef, _b: NodeRef) -> NodeRef {
        unimplemented!()
    }
    fn mk_args(&mut self, _args: &[NodeRef]) -> NodeRef {
        unimplemented!()
    }
    fn mk_apply(&mut self, _fun: NodeRef, _args: NodeRef) -> NodeRef {
        unimplemented!()
    }

    fn mk_lambda(&mut self, param: NodeRef, body: NodeRef) -> NodeRef {
        self.lambda(param, body)
    }

    fn mk_ite(&mut self, _cond: NodeRef, _then_: NodeRef, _else_: NodeRef) -> NodeRef {
        unimplemented!()
    }

    fn mk_fresh_param(&mut self, width: u32) -> NodeRef {
        self.leaf(NodeKind::Param, width)
    }
}
