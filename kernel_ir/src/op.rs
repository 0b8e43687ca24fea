use crate::{OpId, TypeTag};
use arrayvec::ArrayVec;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A kernel parameter. Parameters are never part of the schedule.
    Param,
    /// Projects a field out of a struct value: `[base]`.
    StructExtract { field: String },
    /// Bitcast of a value to another type: `[source]`.
    Reinterpret,
    /// Derives a pointer from a base pointer and one or two indices: `[base, x]` or
    /// `[base, x, y]`.
    AddressCompute,
    /// `[ptr]`
    Load,
    /// `[ptr, value]`. Stores never produce a value.
    Store,
    /// Any operation the promotion pass doesn't model.
    Other { name: String },
}

impl OpKind {
    pub fn mnemonic(&self) -> &str {
        match self {
            OpKind::Param => "param",
            OpKind::StructExtract { .. } => "extract",
            OpKind::Reinterpret => "bitcast",
            OpKind::AddressCompute => "lea",
            OpKind::Load => "load",
            OpKind::Store => "store",
            OpKind::Other { name } => name,
        }
    }

    /// The inclusive range of operand counts this kind accepts.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            OpKind::Param => (0, 0),
            OpKind::StructExtract { .. } | OpKind::Reinterpret | OpKind::Load => (1, 1),
            OpKind::AddressCompute => (2, 3),
            OpKind::Store => (2, 2),
            OpKind::Other { .. } => (0, usize::MAX),
        }
    }
}

/// One IR node of a kernel function. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationNode {
    pub(crate) id: OpId,
    pub(crate) kind: OpKind,
    pub(crate) ty: Option<TypeTag>,
    pub(crate) operands: Vec<OpId>,
}

impl OperationNode {
    pub fn id(&self) -> OpId {
        self.id
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    /// The result type. `None` for operations without a result and for parameters whose type
    /// could not be determined.
    pub fn ty(&self) -> Option<&TypeTag> {
        self.ty.as_ref()
    }

    pub fn operands(&self) -> &[OpId] {
        &self.operands
    }

    pub fn has_pointer_result(&self) -> bool {
        self.ty.as_ref().is_some_and(TypeTag::is_pointer)
    }

    pub fn has_struct_result(&self) -> bool {
        self.ty.as_ref().is_some_and(TypeTag::is_struct)
    }

    /// The value this operation projects from: the struct of an extract, the source of a
    /// reinterpret or the base pointer of an address computation.
    pub fn base(&self) -> Option<OpId> {
        match self.kind {
            OpKind::StructExtract { .. } | OpKind::Reinterpret | OpKind::AddressCompute => {
                self.operands.first().copied()
            }
            _ => None,
        }
    }

    /// The pointer accessed by a load or store.
    pub fn pointer(&self) -> Option<OpId> {
        match self.kind {
            OpKind::Load | OpKind::Store => self.operands.first().copied(),
            _ => None,
        }
    }

    /// The value written by a store.
    pub fn stored_value(&self) -> Option<OpId> {
        match self.kind {
            OpKind::Store => self.operands.get(1).copied(),
            _ => None,
        }
    }

    /// The index operands of an address computation, `[x]` or `[x, y]`. Empty for every other
    /// kind.
    pub fn indices(&self) -> ArrayVec<OpId, 2> {
        let mut indices = ArrayVec::new();
        if self.kind == OpKind::AddressCompute {
            for &index in self.operands.iter().skip(1).take(2) {
                indices.push(index);
            }
        }
        indices
    }
}
