use std::collections::HashSet;

pub use crate::settings::{EdgePolicy, Target};
use crate::{
    analysis,
    codegen::{AccessRewriter, KernelEmitter, TileLayout},
    diagnostic::{AggregateResult, Code, Diagnostic, DiagnosticBuilder, DiagnosticKind},
    inspectors,
    passes::{self, parse::ParsedKernel},
    settings::{Settings, TileConfig},
};
use kernel_ir::KernelOutputter;
use log::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// The analysis result of every kernel.
    Summary,
    /// The parsed kernels, written back in the listing format.
    Listing,
    /// The generated kernel source.
    Kernel,
    AliasDot,
    RustDbg,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Summary => "summary",
            OutputFormat::Listing => "listing",
            OutputFormat::Kernel => "kernel",
            OutputFormat::AliasDot => "alias dot",
            OutputFormat::RustDbg => "rust dbg",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct CompileOpts {
    output_format: OutputFormat,
    settings: Settings,
    upgrade_to_err: HashSet<Code>,
}

#[derive(Debug, Clone)]
pub struct CompileOptsBuilder {
    output_format: OutputFormat,
    target: Target,
    tile: TileConfig,
    edge_policy: EdgePolicy,
    upgrade_to_err: HashSet<Code>,
}

#[derive(Debug, Clone)]
pub enum CompileOptsErr {
    ZeroBlockDimension((u32, u32)),
    ZeroFilterDimension((u32, u32)),
    TileTooLarge(TileConfig),
}

impl std::fmt::Display for CompileOptsErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileOptsErr::ZeroBlockDimension((x, y)) => {
                write!(f, "Block dimensions must be at least 1, got {x}x{y}.")
            }
            CompileOptsErr::ZeroFilterDimension((x, y)) => {
                write!(f, "Filter dimensions must be at least 1, got {x}x{y}.")
            }
            CompileOptsErr::TileTooLarge(TileConfig { block, filter }) => write!(
                f,
                "A {}x{} block with a {}x{} filter needs a tile that is too large.",
                block.0, block.1, filter.0, filter.1
            ),
        }
    }
}

impl std::error::Error for CompileOptsErr {}

impl Default for CompileOptsBuilder {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Summary,
            target: Target::Accelerator,
            tile: TileConfig::default(),
            edge_policy: EdgePolicy::default(),
            upgrade_to_err: HashSet::default(),
        }
    }
}

impl CompileOptsBuilder {
    /// Output a summary for the accelerator target, with a 128x1 block and a 5x5 filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// The block size of kernels that don't declare their own.
    pub fn block(mut self, block: (u32, u32)) -> Self {
        self.tile.block = block;
        self
    }

    /// The filter size of kernels that don't declare their own.
    pub fn filter(mut self, filter: (u32, u32)) -> Self {
        self.tile.filter = filter;
        self
    }

    pub fn edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    pub fn with_code_to_upgrade(mut self, code: Code) -> Self {
        self.upgrade_to_err.insert(code);
        self
    }

    pub fn build(self) -> Result<CompileOpts, CompileOptsErr> {
        let TileConfig { block, filter } = self.tile;
        if block.0 == 0 || block.1 == 0 {
            return Err(CompileOptsErr::ZeroBlockDimension(block));
        }
        if filter.0 == 0 || filter.1 == 0 {
            return Err(CompileOptsErr::ZeroFilterDimension(filter));
        }
        if TileLayout::new(&self.tile).is_none() {
            return Err(CompileOptsErr::TileTooLarge(self.tile));
        }
        let settings = Settings {
            target: self.target,
            tile: self.tile,
            edge_policy: self.edge_policy,
        };
        Ok(CompileOpts {
            output_format: self.output_format,
            settings,
            upgrade_to_err: self.upgrade_to_err,
        })
    }
}

pub fn compile(source: &str, opts: &CompileOpts) -> AggregateResult<Vec<u8>> {
    let mut res = run_compile(source, opts);
    res.upgrade_diagnostics(|d| opts.upgrade_to_err.contains(d.code()));
    res
}

fn run_compile(source: &str, opts: &CompileOpts) -> AggregateResult<Vec<u8>> {
    let parsed = passes::parse::parse(source);

    match opts.output_format {
        OutputFormat::Listing => {
            return parsed.map(|kernels| {
                let mut output = String::new();
                for (i, parsed) in kernels.iter().enumerate() {
                    if i > 0 {
                        output.push('\n');
                    }
                    KernelOutputter::new(&mut output)
                        .write_kernel(&parsed.kernel)
                        .unwrap();
                }
                output.into_bytes()
            });
        }
        OutputFormat::RustDbg => {
            return parsed.map(|kernels| format!("{kernels:#?}\n").into_bytes());
        }
        _ => {}
    }

    parsed.and_then(|kernels| {
        let mut res = AggregateResult::new_ok(String::new());
        for (i, parsed) in kernels.iter().enumerate() {
            let kernel_res = promote_kernel(parsed, opts);
            if let (Some(output), Some(kernel_output)) = (res.value_mut(), kernel_res.value()) {
                if i > 0 {
                    output.push('\n');
                }
                output.push_str(kernel_output);
            }
            for (kind, diagnostic) in kernel_res.into_diagnostics() {
                match kind {
                    DiagnosticKind::Rec => res.add_rec_diagnostic(diagnostic),
                    DiagnosticKind::Err => res.add_err(diagnostic),
                }
            }
        }
        res.map(String::into_bytes)
    })
}

/// Runs the promotion pass over one kernel and formats the result.
fn promote_kernel(parsed: &ParsedKernel, opts: &CompileOpts) -> AggregateResult<String> {
    let settings = &opts.settings;
    let tile = TileConfig {
        block: parsed.block.map_or(settings.tile.block, |(block, _)| block),
        filter: parsed.filter.map_or(settings.tile.filter, |(filter, _)| filter),
    };
    let kernel = &parsed.kernel;
    let mut res = AggregateResult::new_ok(());

    if tile.filter.0 % 2 == 0 || tile.filter.1 % 2 == 0 {
        let span = parsed.filter.map_or(parsed.span, |(_, span)| span);
        let (w, h) = tile.filter;
        res.add_rec_diagnostic(DiagnosticBuilder::new(span).build_even_filter_size(w, h));
    }

    let Some(layout) = TileLayout::new(&tile) else {
        res.add_err(tile_too_large(parsed, &tile));
        return res.map(|()| String::new());
    };
    for (id, buffer) in parsed.buffers.iter() {
        if layout.row_len(buffer.stride).is_none() {
            let span = parsed.buffer_spans.get(&id).copied().unwrap_or(parsed.span);
            let what = format!(
                "a tile of {} pixels with {} elements per pixel is too large",
                layout.len(),
                buffer.stride
            );
            res.add_err(DiagnosticBuilder::new(span).build_invalid_launch_config(&what));
        }
    }
    if res.is_err() {
        return res.map(|()| String::new());
    }

    let state = analysis::analyze(kernel);

    let rewriter = AccessRewriter::new(kernel, &state, &layout, &parsed.buffers)
        .with_promotion(settings.promotes());
    for op in kernel.operations().filter(|op| rewriter.is_unmappable(op)) {
        let name = kernel.display_name(op.id());
        res.add_rec_diagnostic(
            DiagnosticBuilder::new(parsed.span_of(op.id())).build_unmappable_access(&name),
        );
    }

    info!(
        "kernel `{}`: {} buffer(s) promoted with {}x{} tiles",
        kernel.name(),
        state.promoted_buffers().len(),
        layout.extent().0,
        layout.extent().1,
    );

    let mut output = String::new();
    match opts.output_format {
        OutputFormat::Summary => {
            let layout = settings.promotes().then_some(&layout);
            inspectors::inspect_summary(&mut output, kernel, &state, layout).unwrap();
        }
        OutputFormat::AliasDot => {
            inspectors::inspect_aliases(&mut output, kernel, &state).unwrap();
        }
        OutputFormat::Kernel => {
            let emitted = KernelEmitter::new(kernel, &state, layout, &parsed.buffers, settings)
                .emit()
                .unwrap();
            output = emitted.source;
        }
        OutputFormat::Listing | OutputFormat::RustDbg => unreachable!(
            "Format {:?} should have been handled before",
            opts.output_format
        ),
    }
    res.map(|()| output)
}

/// Points at the `block` directive, and at the `filter` directive if there is one.
fn tile_too_large(parsed: &ParsedKernel, tile: &TileConfig) -> Diagnostic {
    let (bx, by) = tile.block;
    let (fw, fh) = tile.filter;
    let what = format!("a {bx}x{by} block with a {fw}x{fh} filter needs a tile that is too large");
    let builder = match (parsed.block, parsed.filter) {
        (Some((_, block)), Some((_, filter))) => DiagnosticBuilder::new(block)
            .with_additional_span(filter, Some("filter declared here".to_owned())),
        (Some((_, span)), None) | (None, Some((_, span))) => DiagnosticBuilder::new(span),
        (None, None) => DiagnosticBuilder::new(parsed.span),
    };
    builder.build_invalid_launch_config(&what)
}
