use super::{KernelFunction, ParameterDescriptor};
use crate::{validator, OpId, OpKind, TypeTag, ValidationError};

/// Builds a [`KernelFunction`] one value at a time, in program order.
///
/// Every method that creates a value returns its fresh [`OpId`], which can be used as an operand
/// of later operations. Operations are scheduled in the order they are added.
#[derive(Debug, Clone)]
pub struct KernelBuilder {
    function: KernelFunction,
}

impl KernelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            function: KernelFunction::new(name.into()),
        }
    }

    pub fn add_param(
        &mut self,
        name: impl Into<String>,
        ty: Option<TypeTag>,
        is_filter: bool,
    ) -> OpId {
        let name = name.into();
        let id = self.function.insert_node(OpKind::Param, Vec::new(), ty.clone());
        self.function.set_name(id, name.clone());
        self.function.push_param(ParameterDescriptor {
            id,
            name,
            ty,
            is_filter,
        });
        id
    }

    /// Adds an operation at the end of the schedule.
    pub fn push(&mut self, kind: OpKind, operands: Vec<OpId>, ty: Option<TypeTag>) -> OpId {
        let id = self.function.insert_node(kind, operands, ty);
        self.function.push_scheduled(id);
        id
    }

    pub fn extract(&mut self, base: OpId, field: impl Into<String>, ty: TypeTag) -> OpId {
        let kind = OpKind::StructExtract {
            field: field.into(),
        };
        self.push(kind, vec![base], Some(ty))
    }

    pub fn reinterpret(&mut self, source: OpId) -> OpId {
        self.push(OpKind::Reinterpret, vec![source], Some(TypeTag::Pointer))
    }

    /// `indices` should hold one (linear) or two (x, y) index values.
    pub fn address(&mut self, base: OpId, indices: &[OpId]) -> OpId {
        let mut operands = vec![base];
        operands.extend_from_slice(indices);
        self.push(OpKind::AddressCompute, operands, Some(TypeTag::Pointer))
    }

    pub fn load(&mut self, ptr: OpId) -> OpId {
        self.push(OpKind::Load, vec![ptr], Some(TypeTag::Scalar))
    }

    pub fn store(&mut self, ptr: OpId, value: OpId) -> OpId {
        self.push(OpKind::Store, vec![ptr, value], None)
    }

    pub fn other(
        &mut self,
        name: impl Into<String>,
        operands: Vec<OpId>,
        ty: Option<TypeTag>,
    ) -> OpId {
        let kind = OpKind::Other { name: name.into() };
        self.push(kind, operands, ty)
    }

    /// Attaches a display name to a value. Names are not required to be unique.
    pub fn set_name(&mut self, id: OpId, name: impl Into<String>) {
        self.function.set_name(id, name.into());
    }

    /// The function built so far. It is only validated by [`KernelBuilder::build`].
    pub fn function(&self) -> &KernelFunction {
        &self.function
    }

    /// Validates and returns the kernel function.
    pub fn build(self) -> Result<KernelFunction, ValidationError> {
        validator::validate(&self.function)?;
        Ok(self.function)
    }
}
