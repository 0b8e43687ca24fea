#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// Massively parallel backend: buffers can be promoted to per-block tile memory.
    #[default]
    Accelerator,
    /// Sequential backend: no tile memory, every access stays global.
    Host,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Target::Accelerator => "accelerator",
            Target::Host => "host",
        };
        write!(f, "{name}")
    }
}

/// What happens to tile cells whose source pixel lies outside the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgePolicy {
    /// The cell is never written. Code reading the tile must check the image bounds itself
    /// before every read.
    #[default]
    Unwritten,
    /// The cell is written with zero by the copy loop.
    ZeroFill,
}

/// Launch configuration of one kernel: the block size and the size of the filter it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    pub block: (u32, u32),
    pub filter: (u32, u32),
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            block: (128, 1),
            filter: (5, 5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub target: Target,
    /// Used for kernels that don't specify their own block or filter size.
    pub tile: TileConfig,
    pub edge_policy: EdgePolicy,
}

impl Settings {
    /// Whether buffers may be promoted to tile memory for this target.
    pub fn promotes(&self) -> bool {
        self.target == Target::Accelerator
    }
}
