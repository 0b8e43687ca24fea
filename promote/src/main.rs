mod cli;
mod report;
mod util;

use anyhow::{bail, Context, Result};
use clap::Parser;

use promote_lib::compile::compile;
use std::io::Write;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let source = cli::open_input_source(&args)?;
    log::debug!("read {} bytes from {}", source.source().len(), args.input_path);

    let compile_opts = cli::extract_compile_opts(&args)?;
    let res = compile(source.source(), &compile_opts);

    if !res.is_ok() {
        report::eprint_aggregate(&res, &source);
    }

    let Some(output) = res.into_value() else {
        bail!("couldn't promote buffers due to the previous errors");
    };

    cli::open_output(&args)?
        .write_all(&output)
        .with_context(|| "Failed to write to output".to_string())?;

    Ok(())
}
