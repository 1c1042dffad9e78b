//! The opaque expression-DAG collaborator.
//!
//! The graph itself — node kinds, hash-consing, refcounting, simplification,
//! and the rewriting constructors — lives in the enclosing solver and is out
//! of scope here (see the crate-level docs). The engine only ever talks to
//! it through [`ExprGraph`], the same way the teacher's egraph mid-end talks
//! to CLIF functions only through the `Language` trait.

use cranelift_entity::{entity_impl, EntityRef};
use smallvec::SmallVec;

/// The regular (non-inverted) identity of a node: the key under which the
/// host graph hash-conses, refcounts, and (for this crate) memoizes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);
entity_impl!(NodeId, "node");

/// A reference to a node, with the inversion bit folded into the low bit of
/// the packed value (§3, "inversion bit"). Two `NodeRef`s with the same
/// `id()` but different `inverted()` denote logically negated views of the
/// same underlying node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    /// Build a reference to `id`, optionally inverted.
    pub fn new(id: NodeId, inverted: bool) -> Self {
        NodeRef(((id.index() as u32) << 1) | inverted as u32)
    }

    /// The regular node identity, with the inversion bit stripped.
    #[inline]
    pub fn id(self) -> NodeId {
        NodeId::new((self.0 >> 1) as usize)
    }

    #[inline]
    pub fn inverted(self) -> bool {
        (self.0 & 1) != 0
    }

    /// Compose (XOR) the inversion bit, preserving identity.
    #[inline]
    pub fn invert(self) -> Self {
        NodeRef(self.0 ^ 1)
    }

    /// The same node, with the inversion bit cleared.
    #[inline]
    pub fn regular(self) -> Self {
        NodeRef(self.0 & !1)
    }

    /// Re-apply `self`'s inversion onto a freshly produced `inner` reference,
    /// composing the two bits. Used at `BETA_REDUCE_PUSH_ARG_STACK` sites
    /// where a popped node's inversion must survive rebuild.
    #[inline]
    pub fn compose(self, inner: NodeRef) -> Self {
        NodeRef(inner.0 ^ (self.0 & 1))
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef::new(id, false)
    }
}

impl core::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.inverted() {
            write!(f, "!{:?}", self.id())
        } else {
            write!(f, "{:?}", self.id())
        }
    }
}

/// The fixed set of node shapes the engine knows how to rebuild (§3).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    BvConst,
    BvVar,
    ArrayVar,
    Param,
    Slice,
    And,
    Eq,
    Add,
    Mul,
    Ult,
    Sll,
    Srl,
    Udiv,
    Urem,
    Concat,
    /// A 1-to-3-ary positional argument tuple.
    Args,
    Apply,
    Lambda,
    BvCond,
    ArrayCond,
}

impl NodeKind {
    /// Whether this kind ever carries children (arity > 0 at runtime is a
    /// property of the specific node, not the kind, except for leaves which
    /// are always arity 0).
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeKind::BvConst | NodeKind::BvVar | NodeKind::ArrayVar | NodeKind::Param
        )
    }

    pub fn is_binary_arith(self) -> bool {
        matches!(
            self,
            NodeKind::And
                | NodeKind::Eq
                | NodeKind::Add
                | NodeKind::Mul
                | NodeKind::Ult
                | NodeKind::Sll
                | NodeKind::Srl
                | NodeKind::Udiv
                | NodeKind::Urem
                | NodeKind::Concat
        )
    }
}

/// A constant bit-string, MSB first, as produced by `evaluate_to_const`.
/// Only the leading bit is consulted by the partial reducer's ITE
/// short-circuiting (§4.5); the rest is kept for callers outside this crate
/// that want the full assignment.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConstBits(pub SmallVec<[u8; 64]>);

impl ConstBits {
    pub fn from_bits(bits: &str) -> Self {
        ConstBits(bits.bytes().collect())
    }

    /// `true` if the leading (most-significant, i.e. first) bit is `1`.
    pub fn is_true(&self) -> bool {
        self.0.first() == Some(&b'1')
    }
}

/// The contract the enclosing solver's expression DAG must satisfy for this
/// engine to beta-reduce it. Every method here is the "opaque operation"
/// vocabulary from §1/§6.1; this crate never inspects a concrete node
/// representation directly.
pub trait ExprGraph {
    // -- introspection --
    fn kind(&self, n: NodeRef) -> NodeKind;
    fn arity(&self, n: NodeRef) -> u8;
    fn child(&self, n: NodeRef, i: u8) -> NodeRef;
    fn width(&self, n: NodeRef) -> u32;
    /// `(upper, lower)` bit bounds; only meaningful for `NodeKind::Slice`.
    fn slice_bounds(&self, n: NodeRef) -> (u32, u32);

    fn is_parameterized(&self, n: NodeRef) -> bool;
    fn has_lambda_below(&self, n: NodeRef) -> bool;
    fn is_chain(&self, n: NodeRef) -> bool;
    fn is_constraint(&self, n: NodeRef) -> bool;
    /// Whether `n` has already been rewritten into a Tseitin-clause form
    /// that the partial reducer treats as an opaque leaf, same as a
    /// function or args node (§4.5, `BETA_REDUCE_PARTIAL_START`).
    fn is_tseitin(&self, n: NodeRef) -> bool;
    /// True iff `n` is a lambda that is not the head of its chain, i.e. it
    /// occurs as the body of an enclosing lambda (§3, "nested lambda"). A
    /// scope is opened only for chain heads; nested lambdas share the
    /// enclosing scope's tables (§4.2 step 1).
    fn is_nested_lambda(&self, n: NodeRef) -> bool;

    // -- refcounting --
    fn copy(&mut self, n: NodeRef) -> NodeRef;
    fn release(&mut self, n: NodeRef);

    // -- partial-reduction-only visit marking (§4.5) --
    /// `beta_mark` is a per-node byte used exclusively by the partial
    /// reducer to track visit state (0 = unstarted, 1 = children pushed,
    /// 2 = rebuilt). The full/bounded/chain reducer never touches it,
    /// keeping its own marks in scope-local tables instead (§5, "Node
    /// mutation discipline").
    fn beta_mark(&self, n: NodeRef) -> u8;
    fn set_beta_mark(&mut self, n: NodeRef, mark: u8);

    // -- canonicalization --
    fn simplify(&mut self, n: NodeRef) -> NodeRef;
    fn chase_forwarded(&mut self, n: NodeRef) -> NodeRef;

    // -- evaluation (partial reduction only) --
    fn evaluate_to_const(&mut self, n: NodeRef) -> Option<ConstBits>;

    // -- rewriting constructors --
    fn mk_slice(&mut self, a: NodeRef, upper: u32, lower: u32) -> NodeRef;
    fn mk_and(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_eq(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_add(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_mul(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_ult(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_sll(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_srl(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_udiv(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_urem(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    fn mk_concat(&mut self, a: NodeRef, b: NodeRef) -> NodeRef;
    /// `args.len()` is always 1, 2, or 3 (§3, "Args node").
    fn mk_args(&mut self, args: &[NodeRef]) -> NodeRef;
    fn mk_apply(&mut self, fun: NodeRef, args: NodeRef) -> NodeRef;
    fn mk_lambda(&mut self, param: NodeRef, body: NodeRef) -> NodeRef;
    fn mk_ite(&mut self, cond: NodeRef, then_: NodeRef, else_: NodeRef) -> NodeRef;
    /// Allocate a fresh, uniquely-identified parameter of the given width.
    /// Exposed for interface completeness (§6.1); the engine itself never
    /// calls this; see DESIGN.md on the dead rebuild-lambda branch.
    fn mk_fresh_param(&mut self, width: u32) -> NodeRef;
}

/// Dispatch a binary rewriting constructor by [`NodeKind`]. Shared between
/// the full/bounded/chain reducer and the partial reducer, which rebuild
/// identically for these kinds (§4.3, §4.5).
pub(crate) fn mk_binary<G: ExprGraph>(graph: &mut G, kind: NodeKind, a: NodeRef, b: NodeRef) -> NodeRef {
    match kind {
        NodeKind::And => graph.mk_and(a, b),
        NodeKind::Eq => graph.mk_eq(a, b),
        NodeKind::Add => graph.mk_add(a, b),
        NodeKind::Mul => graph.mk_mul(a, b),
        NodeKind::Ult => graph.mk_ult(a, b),
        NodeKind::Sll => graph.mk_sll(a, b),
        NodeKind::Srl => graph.mk_srl(a, b),
        NodeKind::Udiv => graph.mk_udiv(a, b),
        NodeKind::Urem => graph.mk_urem(a, b),
        NodeKind::Concat => graph.mk_concat(a, b),
        _ => unreachable!("mk_binary called with non-binary kind {:?}", kind),
    }
}

/// Rebuild an `args` node from its (already-reversed-back-to-forward-order)
/// children (§4.3 rebuild table, "args" row).
pub(crate) fn mk_args_in_order<G: ExprGraph>(graph: &mut G, e: &[NodeRef]) -> NodeRef {
    debug_assert!(e.len() >= 1 && e.len() <= 3);
    graph.mk_args(e)
}
