use super::{buffer_key, tile_name, value_name, Buffers, TileLayout};
use crate::analysis::AnalysisState;
use kernel_ir::{KernelFunction, OpId, OpKind, OperationNode};
use std::{collections::BTreeSet, fmt};

/// The address an address-compute site evaluates to in the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// A cell of a block-local tile, at local coordinates.
    Tile {
        tile: String,
        row: String,
        column: String,
    },
    /// The unchanged global-memory address `base + offset`.
    Global { base: String, offset: String },
}

impl Access {
    pub fn is_tile(&self) -> bool {
        matches!(self, Access::Tile { .. })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Tile { tile, row, column } => write!(f, "&{tile}[{row}][{column}]"),
            Access::Global { base, offset } => write!(f, "{base} + {offset}"),
        }
    }
}

/// Decides, for every address-compute site, whether it reads the tile or global memory.
///
/// Must only be used with the final analysis state of the whole kernel: a store after the site
/// in program order still keeps it global.
pub struct AccessRewriter<'a> {
    kernel: &'a KernelFunction,
    state: &'a AnalysisState,
    layout: &'a TileLayout,
    buffers: &'a Buffers,
    promotes: bool,
    /// Blacklisted pointers and every pointer they are derived from by reinterprets and address
    /// computations.
    written: BTreeSet<OpId>,
}

impl<'a> AccessRewriter<'a> {
    pub fn new(
        kernel: &'a KernelFunction,
        state: &'a AnalysisState,
        layout: &'a TileLayout,
        buffers: &'a Buffers,
    ) -> Self {
        Self {
            kernel,
            state,
            layout,
            buffers,
            promotes: true,
            written: written_pointers(kernel, state),
        }
    }

    /// With `false`, every site keeps its global access.
    pub fn with_promotion(self, promotes: bool) -> Self {
        Self { promotes, ..self }
    }

    /// Whether `site` addresses a promoted buffer. Such a site reads the tile if it has a 2-D
    /// coordinate, see [`AccessRewriter::is_unmappable`].
    pub fn addresses_tile(&self, site: &OperationNode) -> bool {
        if !self.promotes || *site.kind() != OpKind::AddressCompute {
            return false;
        }
        let promotion = &self.state.promotion;
        // Stores through pointers derived from this site must reach global memory.
        if self.written.contains(&site.id()) {
            return false;
        }
        promotion.is_promoted(site.id()) || site.base().is_some_and(|b| promotion.is_promoted(b))
    }

    /// A site addressing a promoted buffer with a single linear index. There is no 2-D
    /// coordinate to map into the tile, so it keeps reading global memory.
    pub fn is_unmappable(&self, site: &OperationNode) -> bool {
        self.addresses_tile(site) && site.indices().len() < 2
    }

    /// The access for an address-compute site, `None` for any other operation.
    pub fn rewrite(&self, site: &OperationNode) -> Option<Access> {
        let base = site.base().filter(|_| *site.kind() == OpKind::AddressCompute)?;
        let indices = site.indices();

        if self.addresses_tile(site) {
            let references = &self.state.references;
            let buffer = references
                .buffer_of(site.id())
                .or_else(|| references.buffer_of(base));
            if let (Some(buffer), [x, y]) = (buffer, &indices[..]) {
                let stride = self.buffers.descriptor(self.kernel, buffer).stride;
                let key = buffer_key(self.kernel, buffer);
                let (x, y) = (self.name(*x), self.name(*y));
                return Some(self.tile_access(&key, stride, &x, &y));
            }
        }

        let base_name = self.name(base);
        let offset = match &indices[..] {
            [x, y] => {
                let buffer = self
                    .kernel
                    .buffer_of(base)
                    .map(|buffer| self.buffers.descriptor(self.kernel, buffer));
                let width = buffer.as_ref().map_or("width", |b| b.width.as_str());
                let linear = format!("{} * {width} + {}", self.name(*y), self.name(*x));
                match buffer.map_or(1, |b| b.stride) {
                    1 => format!("({linear})"),
                    stride => format!("({linear}) * {stride}"),
                }
            }
            [x] => self.name(*x),
            _ => "0".to_owned(),
        };
        Some(Access::Global {
            base: base_name,
            offset,
        })
    }

    /// `local = global - blockOrigin + halo` on both axes.
    fn tile_access(&self, key: &str, stride: u32, x: &str, y: &str) -> Access {
        let (bx, by) = self.layout.block();
        let (hx, hy) = self.layout.halo();
        let column = format!("{x} - blockIdx.x * {bx} + {hx}");
        let column = match stride {
            1 => column,
            stride => format!("({column}) * {stride}"),
        };
        Access::Tile {
            tile: tile_name(key),
            row: format!("{y} - blockIdx.y * {by} + {hy}"),
            column,
        }
    }

    fn name(&self, id: OpId) -> String {
        value_name(self.kernel, id)
    }
}

fn written_pointers(kernel: &KernelFunction, state: &AnalysisState) -> BTreeSet<OpId> {
    let mut written = BTreeSet::new();
    for pointer in state.promotion.blacklisted() {
        written.insert(pointer);
        let mut current = kernel.get(pointer);
        while let Some(node) = current {
            if !matches!(node.kind(), OpKind::Reinterpret | OpKind::AddressCompute) {
                break;
            }
            let Some(base) = node.base() else {
                break;
            };
            if !written.insert(base) {
                break;
            }
            current = kernel.get(base);
        }
    }
    written
}
