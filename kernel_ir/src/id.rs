use generational_arena::Index as ArenaIndex;
use std::fmt;

/// Opaque identity of a value (parameter or operation) within one kernel function.
///
/// Ids are never reused within a kernel, and their order is the order in which the values were
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub(crate) ArenaIndex);

impl OpId {
    /// The creation index of this id. Unique within the kernel it belongs to.
    pub fn index(self) -> usize {
        self.0.into_raw_parts().0
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.index())
    }
}
