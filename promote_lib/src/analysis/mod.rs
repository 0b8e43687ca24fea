//! Analysis phase of buffer promotion.
//!
//! Runs over one kernel function at a time and produces an [`AnalysisState`]: the values aliasing
//! the kernel's buffer parameters, and which of the aliasing pointers are promoted to tile memory
//! or blacklisted. The state is created fresh for each kernel; nothing is shared between kernels.

mod classifier;
mod state;
#[cfg(test)]
mod test;
mod tracker;

pub use classifier::CandidateClassifier;
pub use state::{AnalysisState, PromotedBuffer, PromotionState, ReferenceSet};
pub use tracker::ReferenceTracker;

use kernel_ir::KernelFunction;
use log::debug;

pub fn analyze(kernel: &KernelFunction) -> AnalysisState {
    let mut tracker = ReferenceTracker::new();
    tracker.register(kernel.params());
    for op in kernel.operations() {
        tracker.observe(op);
    }
    let references = tracker.finish();

    let promotion = CandidateClassifier::new(&references).classify(kernel.operations());

    debug!(
        "kernel `{}`: {} references, {} pointers, {} promoted, {} blacklisted",
        kernel.name(),
        references.references().count(),
        references.pointers().count(),
        promotion.promoted().count(),
        promotion.blacklisted().count(),
    );

    AnalysisState {
        references,
        promotion,
    }
}
