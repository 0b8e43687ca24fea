
use crate::{KernelFunction, OpKind, OperationNode};
use std::fmt::Result;

/// Formats [`KernelFunction`]s in the textual listing format.
///
/// A mutable reference to the writer---an implementor of [`std::fmt::Write`]---must be passed to
/// [`KernelOutputter::new`]. Then kernels can be formatted using
/// [`KernelOutputter::write_kernel`].
///
/// The output only contains the kernel itself (its parameters and schedule). Launch
/// configuration and buffer descriptions are not part of a [`KernelFunction`].
pub struct KernelOutputter<'w, W: std::fmt::Write> {
    writer: &'w mut W,
}

impl<'w, W: std::fmt::Write> KernelOutputter<'w, W> {
    pub fn new(writer: &'w mut W) -> Self {
        Self { writer }
    }

    pub fn write_kernel(&mut self, kernel: &KernelFunction) -> Result {
        writeln!(self.writer, "kernel {}", kernel.name())?;

        for param in kernel.params() {
            write!(self.writer, "param {} : ", kernel.display_name(param.id))?;
            if param.is_filter {
                self.writer.write_str("filter ")?;
            }
            match &param.ty {
                Some(ty) => writeln!(self.writer, "{ty}")?,
                None => writeln!(self.writer, "?")?,
            }
        }

        for op in kernel.operations() {
            self.write_operation(kernel, op)?;
        }
        Ok(())
    }

    pub fn write_operation(&mut self, kernel: &KernelFunction, op: &OperationNode) -> Result {
        if op.ty().is_some() {
            write!(self.writer, "{} = ", kernel.display_name(op.id()))?;
        }

        self.writer.write_str(op.kind().mnemonic())?;

        for (i, &operand) in op.operands().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(self.writer, "{sep}{}", kernel.display_name(operand))?;
        }

        if let OpKind::StructExtract { field } = op.kind() {
            write!(self.writer, ", {field}")?;
        }

        match op.ty() {
            Some(ty) => writeln!(self.writer, " : {ty}"),
            None => writeln!(self.writer),
        }
    }
}
