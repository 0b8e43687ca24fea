use super::{BufferDescriptor, CodeWriter, TileLayout};
use crate::settings::EdgePolicy;
use std::fmt::{Error, Result, Write};

/// A tile to allocate and fill at kernel entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// The name of the tile array in the generated code.
    pub name: String,
    pub buffer: BufferDescriptor,
}

impl Tile {
    /// `key` names the buffer, see [`buffer_key`](super::buffer_key).
    pub fn new(key: &str, buffer: BufferDescriptor) -> Self {
        Self {
            name: tile_name(key),
            buffer,
        }
    }
}

pub fn tile_name(key: &str) -> String {
    format!("tile_{key}")
}

/// Emits the code that loads the promoted buffers into block-local tiles.
///
/// All threads of a block cooperate: every thread copies the tile cells at its own thread
/// position, stepping by the block size until the whole tile extent is covered. One barrier
/// follows the copy loops of all tiles, before any thread reads a tile. The barrier must be
/// reached by every thread in the block, so it is only ever emitted at kernel entry.
pub struct TileCodeEmitter<'l> {
    layout: &'l TileLayout,
    edge_policy: EdgePolicy,
}

impl<'l> TileCodeEmitter<'l> {
    pub fn new(layout: &'l TileLayout, edge_policy: EdgePolicy) -> Self {
        Self {
            layout,
            edge_policy,
        }
    }

    /// Declarations, copy loops and the barrier for `tiles`. Writes nothing if there are no
    /// tiles.
    pub fn emit_entry<W: Write>(&self, w: &mut CodeWriter<'_, W>, tiles: &[Tile]) -> Result {
        if tiles.is_empty() {
            return Ok(());
        }
        for tile in tiles {
            self.emit_declaration(w, tile)?;
        }
        for tile in tiles {
            self.emit_copy_loop(w, tile)?;
        }
        self.emit_barrier(w)
    }

    /// Fails if the tile is too large for the stride of its buffer, see
    /// [`TileLayout::row_len`].
    pub fn emit_declaration<W: Write>(&self, w: &mut CodeWriter<'_, W>, tile: &Tile) -> Result {
        let (_, ey) = self.layout.extent();
        let row = self.layout.row_len(tile.buffer.stride).ok_or(Error)?;
        w.line(format_args!(
            "__shared__ {} {}[{ey}][{row}];",
            tile.buffer.elem.c_name(),
            tile.name,
        ))
    }

    pub fn emit_copy_loop<W: Write>(&self, w: &mut CodeWriter<'_, W>, tile: &Tile) -> Result {
        let (bx, by) = self.layout.block();
        let (hx, hy) = self.layout.halo();
        let (ex, ey) = self.layout.extent();
        let buffer = &tile.buffer;

        w.open(format_args!("for (int j = 0; j < {ey}; j += {by})"))?;
        w.open(format_args!("for (int i = 0; i < {ex}; i += {bx})"))?;
        w.line(format_args!("int lx = threadIdx.x + i;"))?;
        w.line(format_args!("int ly = threadIdx.y + j;"))?;
        w.line(format_args!("int gx = blockIdx.x * {bx} - {hx} + lx;"))?;
        w.line(format_args!("int gy = blockIdx.y * {by} - {hy} + ly;"))?;
        w.open(format_args!("if (lx < {ex} && ly < {ey})"))?;
        w.open(format_args!(
            "if (gx >= 0 && gx < {width} && gy >= 0 && gy < {height})",
            width = buffer.width,
            height = buffer.height,
        ))?;
        let source = format!("{}[{}]", buffer.data, self.source_offset(buffer));
        self.emit_cell_copy(w, tile, &source)?;
        if self.edge_policy == EdgePolicy::ZeroFill {
            w.reopen_else()?;
            self.emit_cell_copy(w, tile, "0")?;
        }
        w.close()?;
        w.close()?;
        w.close()?;
        w.close()
    }

    pub fn emit_barrier<W: Write>(&self, w: &mut CodeWriter<'_, W>) -> Result {
        w.line(format_args!("__syncthreads();"))
    }

    fn source_offset(&self, buffer: &BufferDescriptor) -> String {
        match buffer.stride {
            1 => format!("gy * {} + gx", buffer.width),
            stride => format!("(gy * {} + gx) * {stride} + c", buffer.width),
        }
    }

    /// Writes every element of the pixel at `(lx, ly)` with `value`.
    fn emit_cell_copy<W: Write>(
        &self,
        w: &mut CodeWriter<'_, W>,
        tile: &Tile,
        value: &str,
    ) -> Result {
        match tile.buffer.stride {
            1 => w.line(format_args!("{}[ly][lx] = {value};", tile.name)),
            stride => {
                w.open(format_args!("for (int c = 0; c < {stride}; c++)"))?;
                w.line(format_args!("{}[ly][lx * {stride} + c] = {value};", tile.name))?;
                w.close()
            }
        }
    }
}
