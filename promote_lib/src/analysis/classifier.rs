use super::{PromotionState, ReferenceSet};
use kernel_ir::{OpKind, OperationNode};
use log::trace;

/// Decides which tracked pointers can be promoted to tile memory.
///
/// A pointer is promotable if it is loaded from and never stored to, anywhere in the kernel. The
/// result doesn't depend on the relative order of loads and stores: every stored pointer is
/// blacklisted in a first pass over the operations, and only then are the loaded, tracked,
/// non-blacklisted pointers promoted in a second pass.
pub struct CandidateClassifier<'r> {
    references: &'r ReferenceSet,
}

impl<'r> CandidateClassifier<'r> {
    pub fn new(references: &'r ReferenceSet) -> Self {
        Self { references }
    }

    pub fn classify<'k, I>(&self, ops: I) -> PromotionState
    where
        I: IntoIterator<Item = &'k OperationNode>,
        I::IntoIter: Clone,
    {
        let ops = ops.into_iter();
        let mut state = PromotionState::default();

        for op in ops.clone() {
            if let (OpKind::Store, Some(ptr)) = (op.kind(), op.pointer()) {
                trace!("{ptr} is written by {}", op.id());
                state.blacklist(ptr);
            }
        }

        for op in ops {
            let (OpKind::Load, Some(ptr)) = (op.kind(), op.pointer()) else {
                continue;
            };
            if !self.references.is_pointer(ptr) {
                continue;
            }
            if state.promote(ptr) {
                trace!("{ptr} is promotable");
            }
        }

        state
    }
}
