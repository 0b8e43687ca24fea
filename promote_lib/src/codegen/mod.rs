//! Emission phase of buffer promotion: tile code at kernel entry and rewritten accesses.
//!
//! Everything here consumes a finished [`AnalysisState`](crate::analysis::AnalysisState). None
//! of it changes the analysis result.

mod access;
mod buffer;
mod kernel;
mod layout;
mod tile;
mod writer;

pub use access::{Access, AccessRewriter};
pub use buffer::{buffer_key, BufferDescriptor, Buffers};
pub use kernel::{EmittedKernel, KernelEmitter};
pub use layout::TileLayout;
pub use tile::{tile_name, Tile, TileCodeEmitter};
pub use writer::CodeWriter;

use kernel_ir::{KernelFunction, OpId};

/// The name of a value in generated code: the name of a parameter, `vN` for operations.
pub fn value_name(kernel: &KernelFunction, id: OpId) -> String {
    match kernel.param(id) {
        Some(param) => param.name.clone(),
        None => format!("v{}", id.index()),
    }
}
