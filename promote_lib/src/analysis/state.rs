use kernel_ir::OpId;
use std::collections::{BTreeMap, BTreeSet};
use vec1::Vec1;

/// The values that alias a kernel's buffer parameters.
///
/// Each tracked value is mapped to the parameter it was derived from. Sets only grow: once a
/// value is tracked it stays tracked, and its root never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    /// `KernelReferences`: struct-valued values (and the tracked parameters themselves).
    references: BTreeMap<OpId, OpId>,
    /// `KernelPointers`: pointer-valued values.
    pointers: BTreeMap<OpId, OpId>,
    /// The value starting the buffer each pointer points into, see [`ReferenceSet::buffer_of`].
    buffers: BTreeMap<OpId, OpId>,
}

impl ReferenceSet {
    pub fn is_reference(&self, id: OpId) -> bool {
        self.references.contains_key(&id)
    }

    pub fn is_pointer(&self, id: OpId) -> bool {
        self.pointers.contains_key(&id)
    }

    pub fn is_tracked(&self, id: OpId) -> bool {
        self.is_reference(id) || self.is_pointer(id)
    }

    /// The parameter `id` was derived from, if it is tracked.
    pub fn root_of(&self, id: OpId) -> Option<OpId> {
        self.pointers
            .get(&id)
            .or_else(|| self.references.get(&id))
            .copied()
    }

    /// The pointer parameter or extracted pointer that the tracked pointer `id` was derived from.
    /// Two buffers of one parameter (`img.data` and `img.aux`) have the same root but differ
    /// here.
    pub fn buffer_of(&self, id: OpId) -> Option<OpId> {
        self.buffers.get(&id).copied()
    }

    pub fn references(&self) -> impl Iterator<Item = OpId> + '_ {
        self.references.keys().copied()
    }

    pub fn pointers(&self) -> impl Iterator<Item = OpId> + '_ {
        self.pointers.keys().copied()
    }

    pub(crate) fn add_reference(&mut self, id: OpId, root: OpId) -> bool {
        insert_new(&mut self.references, id, root)
    }

    pub(crate) fn add_pointer(&mut self, id: OpId, root: OpId, buffer: OpId) -> bool {
        if !insert_new(&mut self.pointers, id, root) {
            return false;
        }
        self.buffers.insert(id, buffer);
        true
    }
}

fn insert_new(map: &mut BTreeMap<OpId, OpId>, id: OpId, root: OpId) -> bool {
    if map.contains_key(&id) {
        return false;
    }
    map.insert(id, root);
    true
}

/// Which pointers may be routed through tile memory, and which never may.
///
/// The two sets are disjoint at all times: blacklisting a pointer removes it from the promotion
/// set, and a blacklisted pointer can't be promoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionState {
    promoted: BTreeSet<OpId>,
    blacklisted: BTreeSet<OpId>,
}

impl PromotionState {
    pub fn is_promoted(&self, id: OpId) -> bool {
        self.promoted.contains(&id)
    }

    pub fn is_blacklisted(&self, id: OpId) -> bool {
        self.blacklisted.contains(&id)
    }

    pub fn promoted(&self) -> impl Iterator<Item = OpId> + '_ {
        self.promoted.iter().copied()
    }

    pub fn blacklisted(&self) -> impl Iterator<Item = OpId> + '_ {
        self.blacklisted.iter().copied()
    }

    /// Returns `false` if `id` is blacklisted (nothing changes then) or already promoted.
    pub(crate) fn promote(&mut self, id: OpId) -> bool {
        if self.blacklisted.contains(&id) {
            return false;
        }
        self.promoted.insert(id)
    }

    pub(crate) fn blacklist(&mut self, id: OpId) {
        self.promoted.remove(&id);
        self.blacklisted.insert(id);
    }
}

/// The promoted pointers into one buffer. One tile is allocated per promoted buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedBuffer {
    /// The parameter the buffer belongs to.
    pub root: OpId,
    /// The pointer parameter or extracted pointer starting the buffer.
    pub buffer: OpId,
    pub pointers: Vec1<OpId>,
}

/// The final result of the analysis phase for one kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisState {
    pub references: ReferenceSet,
    pub promotion: PromotionState,
}

impl AnalysisState {
    /// Groups the promoted pointers by the buffer they point into, ordered by parameter and then
    /// by buffer.
    pub fn promoted_buffers(&self) -> Vec<PromotedBuffer> {
        let mut buffers: BTreeMap<(OpId, OpId), Vec1<OpId>> = BTreeMap::new();
        for id in self.promotion.promoted() {
            // Promoted pointers are always tracked, see `CandidateClassifier`.
            let (Some(root), Some(buffer)) =
                (self.references.root_of(id), self.references.buffer_of(id))
            else {
                continue;
            };
            match buffers.get_mut(&(root, buffer)) {
                Some(pointers) => pointers.push(id),
                None => {
                    buffers.insert((root, buffer), Vec1::new(id));
                }
            }
        }
        buffers
            .into_iter()
            .map(|((root, buffer), pointers)| PromotedBuffer {
                root,
                buffer,
                pointers,
            })
            .collect()
    }
}
