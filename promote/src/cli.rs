use crate::util::PathOrStd;

use promote_lib::compile::{self, CompileOpts, CompileOptsBuilder, CompileOptsErr, EdgePolicy};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use codespan_reporting::files::SimpleFile;

use std::{fs::File, io::Read};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Summary,
    Listing,
    Kernel,
    AliasDot,
    RustDbg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Accelerator,
    Host,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The input listing, use `-` for std in.
    #[arg(default_value = "-")]
    pub input_path: PathOrStd,

    /// The execution backend. Defaults to accelerator.
    #[arg(short = 't', long, value_name = "TARGET", value_enum)]
    target: Option<Target>,

    /// The output format. Defaults to summary.
    #[arg(short = 'e', long, value_name = "FORMAT", value_enum)]
    emit: Option<OutputFormat>,

    /// Block size for kernels without a `block` directive.
    #[arg(long, value_name = "BX,BY", value_parser = parse_dimensions)]
    block: Option<(u32, u32)>,

    /// Filter size for kernels without a `filter` directive.
    #[arg(long, value_name = "FW,FH", value_parser = parse_dimensions)]
    filter: Option<(u32, u32)>,

    /// Write zero to tile cells outside the image instead of leaving them unwritten.
    #[arg(long)]
    zero_fill_halo: bool,

    /// Log the analysis of every kernel.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// The output file, use `-` for std out.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output_path: PathOrStd,
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let Some((x, y)) = s.split_once(',') else {
        return Err(format!("expected two comma separated numbers, found `{s}`"));
    };
    let parse = |n: &str| {
        n.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension `{n}`: {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

pub fn open_input_source(args: &Args) -> anyhow::Result<SimpleFile<String, String>> {
    match &args.input_path {
        PathOrStd::Path(path) => {
            if !path.exists() {
                bail!("Input file `{}` doesn't exist", path.display());
            }
            let mut handle = File::open(path)
                .with_context(|| format!("Failed to open input file `{}`", path.display()))?;
            let mut s = String::new();
            handle
                .read_to_string(&mut s)
                .with_context(|| format!("Failed to read from input file `{}`", path.display()))?;

            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            Ok(SimpleFile::new(name, s))
        }
        PathOrStd::StdStream => {
            let mut handle = std::io::stdin().lock();
            let mut s = String::new();
            handle
                .read_to_string(&mut s)
                .context("Failed to read from stdin")?;

            Ok(SimpleFile::new("stdin stream".to_owned(), s))
        }
    }
}

pub fn extract_compile_opts(args: &Args) -> Result<CompileOpts, CompileOptsErr> {
    let opts = CompileOptsBuilder::new();

    let opts = if let Some(format) = args.emit {
        let format = match format {
            OutputFormat::Summary => compile::OutputFormat::Summary,
            OutputFormat::Listing => compile::OutputFormat::Listing,
            OutputFormat::Kernel => compile::OutputFormat::Kernel,
            OutputFormat::AliasDot => compile::OutputFormat::AliasDot,
            OutputFormat::RustDbg => compile::OutputFormat::RustDbg,
        };
        opts.output_format(format)
    } else {
        opts
    };

    let opts = if let Some(target) = args.target {
        let target = match target {
            Target::Accelerator => compile::Target::Accelerator,
            Target::Host => compile::Target::Host,
        };
        opts.target(target)
    } else {
        opts
    };

    let opts = match args.block {
        Some(block) => opts.block(block),
        None => opts,
    };
    let opts = match args.filter {
        Some(filter) => opts.filter(filter),
        None => opts,
    };

    let edge_policy = match args.zero_fill_halo {
        true => EdgePolicy::ZeroFill,
        false => EdgePolicy::Unwritten,
    };
    opts.edge_policy(edge_policy).build()
}

pub fn open_output(args: &Args) -> anyhow::Result<Box<dyn std::io::Write>> {
    match &args.output_path {
        PathOrStd::Path(path) => std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .map(|f| Box::new(f) as Box<dyn std::io::Write>)
            .with_context(|| format!("Failed to open output file `{}`", path.display())),
        PathOrStd::StdStream => Ok(Box::new(std::io::stdout().lock())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_pairs() {
        assert_eq!(parse_dimensions("128,1"), Ok((128, 1)));
        assert_eq!(parse_dimensions("16, 16"), Ok((16, 16)));
        assert!(parse_dimensions("128").is_err());
        assert!(parse_dimensions("a,1").is_err());
        assert!(parse_dimensions("1,-1").is_err());
    }

    #[test]
    fn args_select_compile_options() {
        let args = Args::parse_from([
            "promote",
            "in.kir",
            "-e",
            "kernel",
            "-t",
            "host",
            "--block",
            "16,16",
            "--filter",
            "3,3",
            "--zero-fill-halo",
        ]);
        assert!(extract_compile_opts(&args).is_ok());
        assert_eq!(args.block, Some((16, 16)));
        assert!(args.zero_fill_halo);

        let args = Args::parse_from(["promote", "--block", "0,1"]);
        assert!(extract_compile_opts(&args).is_err());
    }

    #[test]
    fn rejects_tiles_that_do_not_fit() {
        let args = Args::parse_from(["promote", "--block", "4294967295,1"]);
        let err = extract_compile_opts(&args).unwrap_err();
        assert!(matches!(err, CompileOptsErr::TileTooLarge(_)));

        let args = Args::parse_from(["promote", "--block", "65536,65536", "--filter", "1,1"]);
        assert!(extract_compile_opts(&args).is_err());
    }
}
