use crate::analysis::AnalysisState;
use kernel_ir::{KernelFunction, OpId};
use std::fmt::{Result, Write};

/// Writes the values aliasing the kernel's parameters as a dot graph. Every tracked value is a
/// node with an edge from the value it was derived from. Promoted pointers are green, blacklisted
/// ones red.
pub fn inspect_aliases<W: Write>(
    w: &mut W,
    kernel: &KernelFunction,
    state: &AnalysisState,
) -> Result {
    writeln!(w, "digraph \"{}\" {{", kernel.name())?;

    let params = kernel.params().iter().map(|param| (param.id, None));
    let ops = kernel.operations().map(|op| (op.id(), Some(op)));
    for (id, op) in params.chain(ops) {
        let tracked = state.references.is_tracked(id);
        if !tracked && !state.promotion.is_blacklisted(id) {
            continue;
        }
        let label = kernel.display_name(id);
        writeln!(w, " {} [label=\"{label}\"{}];", node(id), color(state, id))?;

        let base = op.filter(|_| tracked).and_then(|op| op.base());
        if let (Some(op), Some(base)) = (op, base) {
            let mnemonic = op.kind().mnemonic();
            writeln!(w, " {} -> {} [label=\"{mnemonic}\"];", node(base), node(id))?;
        }
    }

    writeln!(w, "}}")
}

fn node(id: OpId) -> String {
    format!("n{}", id.index())
}

fn color(state: &AnalysisState, id: OpId) -> &'static str {
    if state.promotion.is_promoted(id) {
        ", color=\"green\""
    } else if state.promotion.is_blacklisted(id) {
        ", color=\"red\""
    } else {
        ""
    }
}
