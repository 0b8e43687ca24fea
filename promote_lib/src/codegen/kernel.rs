use super::{
    buffer_key, value_name, AccessRewriter, Buffers, CodeWriter, Tile, TileCodeEmitter, TileLayout,
};
use crate::{analysis::AnalysisState, settings::Settings};
use kernel_ir::{
    KernelFunction, OpId, OpKind, OperationNode, ParameterDescriptor, ScalarTy, TypeTag,
};
use log::{debug, warn};
use std::fmt::{Result, Write};

/// The generated source of one kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedKernel {
    pub source: String,
    pub tiles: Vec<Tile>,
    /// Sites addressing a promoted buffer that kept their global access, in program order.
    pub unmappable: Vec<OpId>,
}

/// Renders a kernel function as C-like source, with the tile code at kernel entry and every
/// address-compute site rewritten by an [`AccessRewriter`].
pub struct KernelEmitter<'a> {
    kernel: &'a KernelFunction,
    state: &'a AnalysisState,
    layout: TileLayout,
    buffers: &'a Buffers,
    settings: &'a Settings,
}

impl<'a> KernelEmitter<'a> {
    pub fn new(
        kernel: &'a KernelFunction,
        state: &'a AnalysisState,
        layout: TileLayout,
        buffers: &'a Buffers,
        settings: &'a Settings,
    ) -> Self {
        Self {
            kernel,
            state,
            layout,
            buffers,
            settings,
        }
    }

    /// The tiles to allocate, one per promoted buffer in parameter order. Always empty if the
    /// target doesn't promote.
    pub fn tiles(&self) -> Vec<Tile> {
        if !self.settings.promotes() {
            return Vec::new();
        }
        self.state
            .promoted_buffers()
            .iter()
            .map(|promoted| {
                let key = buffer_key(self.kernel, promoted.buffer);
                Tile::new(&key, self.buffers.descriptor(self.kernel, promoted.buffer))
            })
            .collect()
    }

    pub fn emit(&self) -> std::result::Result<EmittedKernel, std::fmt::Error> {
        let mut source = String::new();
        let tiles = self.tiles();
        let rewriter = AccessRewriter::new(self.kernel, self.state, &self.layout, self.buffers)
            .with_promotion(self.settings.promotes());
        let mut unmappable = Vec::new();

        let mut w = CodeWriter::new(&mut source);
        w.open(format_args!("{}", self.signature()))?;
        TileCodeEmitter::new(&self.layout, self.settings.edge_policy).emit_entry(&mut w, &tiles)?;
        for op in self.kernel.operations() {
            if rewriter.is_unmappable(op) {
                warn!(
                    "{} in `{}` can't be mapped into a tile",
                    self.kernel.display_name(op.id()),
                    self.kernel.name()
                );
                unmappable.push(op.id());
            }
            self.emit_operation(&mut w, &rewriter, op)?;
        }
        w.close()?;

        debug!(
            "emitted `{}` with {} tile(s) for target {}",
            self.kernel.name(),
            tiles.len(),
            self.settings.target
        );
        Ok(EmittedKernel {
            source,
            tiles,
            unmappable,
        })
    }

    fn signature(&self) -> String {
        let params = self
            .kernel
            .params()
            .iter()
            .map(|param| format!("{} {}", self.param_type(param), param.name))
            .collect::<Vec<_>>()
            .join(", ");
        let qualifier = match self.settings.promotes() {
            true => "__global__ ",
            false => "",
        };
        format!("{qualifier}void {}({params})", self.kernel.name())
    }

    fn param_type(&self, param: &ParameterDescriptor) -> String {
        match &param.ty {
            Some(TypeTag::Struct(name)) => name.clone(),
            Some(TypeTag::Pointer) => {
                let elem = self.buffers.descriptor(self.kernel, param.id).elem;
                format!("{}*", elem.c_name())
            }
            Some(TypeTag::Scalar) => "int".to_owned(),
            None => "void*".to_owned(),
        }
    }

    fn emit_operation<W: Write>(
        &self,
        w: &mut CodeWriter<'_, W>,
        rewriter: &AccessRewriter<'_>,
        op: &OperationNode,
    ) -> Result {
        let result = self.name(op.id());
        let operand = |i: usize| op.operands().get(i).map_or_else(String::new, |&id| self.name(id));

        match op.kind() {
            OpKind::Param => Ok(()),
            OpKind::StructExtract { field } => {
                let is_struct = op
                    .base()
                    .and_then(|base| self.kernel.get(base))
                    .is_some_and(OperationNode::has_struct_result);
                let access = if is_struct { "." } else { "->" };
                w.line(format_args!("auto {result} = {}{access}{field};", operand(0)))
            }
            OpKind::Reinterpret => {
                let elem = self.elem_of(op.id());
                w.line(format_args!("auto {result} = ({}*){};", elem.c_name(), operand(0)))
            }
            OpKind::AddressCompute => match rewriter.rewrite(op) {
                Some(access) => w.line(format_args!("auto {result} = {access};")),
                None => Ok(()),
            },
            OpKind::Load => w.line(format_args!("auto {result} = *{};", operand(0))),
            OpKind::Store => {
                let value = op.stored_value().map_or_else(String::new, |id| self.name(id));
                w.line(format_args!("*{} = {value};", operand(0)))
            }
            OpKind::Other { name } => {
                let args = op
                    .operands()
                    .iter()
                    .map(|&id| self.name(id))
                    .collect::<Vec<_>>()
                    .join(", ");
                match op.ty() {
                    Some(_) => w.line(format_args!("auto {result} = {name}({args});")),
                    None => w.line(format_args!("{name}({args});")),
                }
            }
        }
    }

    /// The element type of the buffer `id` points into, `float` if unknown.
    fn elem_of(&self, id: OpId) -> ScalarTy {
        self.kernel.buffer_of(id).map_or(ScalarTy::F32, |buffer| {
            self.buffers.descriptor(self.kernel, buffer).elem
        })
    }

    fn name(&self, id: OpId) -> String {
        value_name(self.kernel, id)
    }
}
