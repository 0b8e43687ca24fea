use crate::{analysis::AnalysisState, codegen::TileLayout};
use kernel_ir::{KernelFunction, OpId};
use std::fmt::{Result, Write};

/// Writes the analysis result of one kernel, one line per set:
///
/// ```text
/// kernel blur
/// references: %img %x %y
/// pointers: %p %a
/// promoted: %a
/// blacklisted: -
/// tiles: %img.data 132x5
/// ```
///
/// `layout` is `None` if the target doesn't promote, no tiles are listed then.
pub fn inspect_summary<W: Write>(
    w: &mut W,
    kernel: &KernelFunction,
    state: &AnalysisState,
    layout: Option<&TileLayout>,
) -> Result {
    writeln!(w, "kernel {}", kernel.name())?;
    write_set(w, kernel, "references", state.references.references())?;
    write_set(w, kernel, "pointers", state.references.pointers())?;
    write_set(w, kernel, "promoted", state.promotion.promoted())?;
    write_set(w, kernel, "blacklisted", state.promotion.blacklisted())?;

    let tiles = match layout {
        Some(layout) => {
            let (ex, ey) = layout.extent();
            state
                .promoted_buffers()
                .iter()
                .map(|promoted| format!("{} {ex}x{ey}", buffer_label(kernel, promoted.buffer)))
                .collect()
        }
        None => Vec::new(),
    };
    match tiles.is_empty() {
        true => writeln!(w, "tiles: -"),
        false => writeln!(w, "tiles: {}", tiles.join(", ")),
    }
}

/// `%img.data` for a pointer extracted from `img`, `%src` for a pointer parameter.
fn buffer_label(kernel: &KernelFunction, buffer: OpId) -> String {
    match kernel.field_path(buffer) {
        Some(path) => format!("%{}", path.join(".")),
        None => kernel.display_name(buffer),
    }
}

fn write_set<W: Write>(
    w: &mut W,
    kernel: &KernelFunction,
    label: &str,
    ids: impl Iterator<Item = OpId>,
) -> Result {
    write!(w, "{label}:")?;
    let mut empty = true;
    for id in ids {
        write!(w, " {}", kernel.display_name(id))?;
        empty = false;
    }
    if empty {
        w.write_str(" -")?;
    }
    writeln!(w)
}
