use crate::settings::TileConfig;

/// Geometry of the tile one block loads for one promoted buffer.
///
/// The tile covers the pixels the block computes plus a halo of `filter / 2` pixels on every
/// side, so that every filter tap of every thread in the block reads from the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    block: (u32, u32),
    halo: (u32, u32),
}

/// The largest number of elements in one tile. Generated code indexes tiles with `int`.
pub const MAX_TILE_ELEMENTS: u32 = i32::MAX as u32;

impl TileLayout {
    /// `None` if the tile would hold more than [`MAX_TILE_ELEMENTS`] pixels.
    pub fn new(config: &TileConfig) -> Option<Self> {
        let layout = Self {
            block: config.block,
            halo: (config.filter.0 / 2, config.filter.1 / 2),
        };
        layout.row_len(1)?;
        Some(layout)
    }

    pub fn block(&self) -> (u32, u32) {
        self.block
    }

    pub fn halo(&self) -> (u32, u32) {
        self.halo
    }

    /// `(bx + 2 * hx, by + 2 * hy)`
    pub fn extent(&self) -> (u32, u32) {
        // Checked by `TileLayout::new`.
        (
            self.block.0 + 2 * self.halo.0,
            self.block.1 + 2 * self.halo.1,
        )
    }

    /// The number of pixels in the tile.
    pub fn len(&self) -> u32 {
        let (ex, ey) = self.extent();
        ex * ey
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of elements in one tile row for pixels of `stride` elements. `None` if the
    /// whole tile would hold more than [`MAX_TILE_ELEMENTS`] elements.
    pub fn row_len(&self, stride: u32) -> Option<u32> {
        let ex = self.block.0.checked_add(2 * self.halo.0)?;
        let ey = self.block.1.checked_add(2 * self.halo.1)?;
        let row = ex.checked_mul(stride)?;
        row.checked_mul(ey)
            .filter(|&elements| elements <= MAX_TILE_ELEMENTS)
            .map(|_| row)
    }
}
