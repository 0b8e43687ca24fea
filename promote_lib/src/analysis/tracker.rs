use super::ReferenceSet;
use kernel_ir::{OpId, OpKind, OperationNode, ParameterDescriptor, TypeTag};
use log::trace;

/// Builds the classes of values that alias a kernel's buffer parameters.
///
/// Aliasing only propagates through three operations: struct extraction, reinterpretation and
/// address computation, each taking the tracked value as its first operand. Values that are
/// related to a parameter in any other way (through arithmetic, loads, calls or values merged
/// across control flow) are not tracked.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    set: ReferenceSet,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the reference set with every parameter except those of the filter type and those
    /// whose type is unknown. Pointer parameters are also seeded as pointers.
    pub fn register(&mut self, params: &[ParameterDescriptor]) {
        for param in params {
            if param.is_filter {
                trace!("not tracking filter parameter `{}`", param.name);
                continue;
            }
            let Some(ty) = &param.ty else {
                trace!("not tracking parameter `{}` of unknown type", param.name);
                continue;
            };
            self.set.add_reference(param.id, param.id);
            if *ty == TypeTag::Pointer {
                self.set.add_pointer(param.id, param.id, param.id);
            }
        }
    }

    /// Must be called once for every operation, in program order.
    pub fn observe(&mut self, op: &OperationNode) {
        let Some(base) = op.base() else {
            return;
        };

        match op.kind() {
            OpKind::StructExtract { .. } => {
                let Some(root) = self.reference_root(base) else {
                    return;
                };
                if op.has_struct_result() {
                    self.set.add_reference(op.id(), root);
                    trace!("{} extracted from {base}: reference", op.id());
                } else if op.has_pointer_result() {
                    self.set.add_pointer(op.id(), root, op.id());
                    trace!("{} extracted from {base}: pointer", op.id());
                }
            }
            OpKind::Reinterpret | OpKind::AddressCompute => {
                let (Some(root), Some(buffer)) = (self.pointer_root(base), self.set.buffer_of(base))
                else {
                    return;
                };
                self.set.add_pointer(op.id(), root, buffer);
                trace!("{} derived from pointer {base}", op.id());
            }
            _ => {}
        }
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.set
    }

    pub fn finish(self) -> ReferenceSet {
        self.set
    }

    fn reference_root(&self, id: OpId) -> Option<OpId> {
        self.set
            .is_reference(id)
            .then(|| self.set.root_of(id))
            .flatten()
    }

    fn pointer_root(&self, id: OpId) -> Option<OpId> {
        self.set.is_pointer(id).then(|| self.set.root_of(id)).flatten()
    }
}
