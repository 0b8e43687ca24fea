mod builder;
#[cfg(test)]
mod test;

pub use builder::KernelBuilder;

use crate::{OpId, OpKind, OperationNode, TypeTag};
use generational_arena::Arena;
use std::collections::BTreeMap;

/// A kernel parameter as seen by the promotion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub id: OpId,
    pub name: String,
    /// `None` if the type could not be determined.
    pub ty: Option<TypeTag>,
    /// Whether this parameter has the designated immutable filter type.
    pub is_filter: bool,
}

/// One kernel function: its parameters and its operations in program (schedule) order.
///
/// A `KernelFunction` can only be created through a [`KernelBuilder`], which validates it.
#[derive(Debug, Clone)]
pub struct KernelFunction {
    name: String,
    params: Vec<ParameterDescriptor>,
    nodes: Arena<OperationNode>,
    schedule: Vec<OpId>,
    names: BTreeMap<OpId, String>,
}

impl KernelFunction {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            params: Vec::new(),
            nodes: Arena::new(),
            schedule: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn param(&self, id: OpId) -> Option<&ParameterDescriptor> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn get(&self, id: OpId) -> Option<&OperationNode> {
        self.nodes.get(id.0)
    }

    /// The scheduled operations in program order. Parameters are not included.
    pub fn operations(&self) -> impl Iterator<Item = &OperationNode> + Clone {
        self.schedule.iter().map(|&id| &self[id])
    }

    pub fn schedule(&self) -> &[OpId] {
        &self.schedule
    }

    /// The number of values (parameters and operations) in this kernel.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The name given to the value when it was built, if any. Names are for display only, they
    /// never identify a value.
    pub fn debug_name(&self, id: OpId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// `%name` if the value is named, otherwise `%index`.
    pub fn display_name(&self, id: OpId) -> String {
        match self.debug_name(id) {
            Some(name) => format!("%{name}"),
            None => id.to_string(),
        }
    }

    /// Follows the chain of projections (extracts, reinterprets, address computations) starting
    /// at `id` back to the parameter it starts from.
    pub fn origin_param(&self, id: OpId) -> Option<&ParameterDescriptor> {
        let mut current = self.get(id)?;
        loop {
            if current.kind == OpKind::Param {
                return self.param(current.id);
            }
            current = self.get(current.base()?)?;
        }
    }

    /// The value that starts the buffer `id` points into: a pointer parameter or a pointer
    /// extracted from a struct. Reinterprets and address computations are followed back to it.
    pub fn buffer_of(&self, id: OpId) -> Option<OpId> {
        let mut current = self.get(id)?;
        loop {
            match current.kind {
                OpKind::Param | OpKind::StructExtract { .. } => {
                    return current.has_pointer_result().then_some(current.id);
                }
                OpKind::Reinterpret | OpKind::AddressCompute => {
                    current = self.get(current.base()?)?;
                }
                _ => return None,
            }
        }
    }

    /// The parameter name followed by the fields extracted to reach `id`, `["img", "data"]` for
    /// `img.data`. `None` if `id` is not reached from a parameter by struct extracts alone.
    pub fn field_path(&self, id: OpId) -> Option<Vec<&str>> {
        let node = self.get(id)?;
        match &node.kind {
            OpKind::Param => Some(vec![self.param(id)?.name.as_str()]),
            OpKind::StructExtract { field } => {
                let mut path = self.field_path(node.base()?)?;
                path.push(field);
                Some(path)
            }
            _ => None,
        }
    }

    pub(crate) fn push_param(&mut self, param: ParameterDescriptor) {
        self.params.push(param);
    }

    pub(crate) fn insert_node(
        &mut self,
        kind: OpKind,
        operands: Vec<OpId>,
        ty: Option<TypeTag>,
    ) -> OpId {
        let index = self.nodes.insert_with(|index| OperationNode {
            id: OpId(index),
            kind,
            ty,
            operands,
        });
        OpId(index)
    }

    pub(crate) fn push_scheduled(&mut self, id: OpId) {
        self.schedule.push(id);
    }

    pub(crate) fn set_name(&mut self, id: OpId, name: String) {
        self.names.insert(id, name);
    }
}

impl std::ops::Index<OpId> for KernelFunction {
    type Output = OperationNode;

    fn index(&self, id: OpId) -> &Self::Output {
        &self.nodes[id.0]
    }
}
