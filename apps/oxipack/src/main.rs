use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use oxipack_flatten::{Config, flatten_to_fesm, flatten_to_umd, print_bundle_summary};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oxipack")]
#[command(about = "Flatten compiled JavaScript packages into FESM and UMD bundles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Flatten the ES2015 build into a single ES module
    Fesm(Config),
    /// Bundle an existing flat ES module as UMD
    Umd(Config),
    /// Run both steps
    Build(Config),
}

#[derive(Debug, Clone, Copy)]
struct Steps {
    fesm: bool,
    umd: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    let (mut cfg, steps) = match cli.command {
        Commands::Fesm(cfg) => (cfg, Steps { fesm: true, umd: false }),
        Commands::Umd(cfg) => (cfg, Steps { fesm: false, umd: true }),
        Commands::Build(cfg) => (cfg, Steps { fesm: true, umd: true }),
    };
    cfg.initialize()?;

    let engine = cfg.engine()?;
    let mut ctx = cfg.build_context()?;
    info!("Bundling {} ({:?})", ctx.package.name, steps);

    if steps.fesm {
        flatten_to_fesm(&mut ctx, &engine).await?;
    } else if !ctx.adopt_existing_fesm() {
        bail!(
            "{} does not exist; run `oxipack fesm` or `oxipack build` first",
            ctx.fesm_dest().display()
        );
    }
    if steps.umd {
        flatten_to_umd(&mut ctx, &engine).await?;
    }

    let elapsed_ms = start.elapsed().as_millis();

    print_bundle_summary(&mut stdout, &ctx.entry_point.module_id, &ctx.artefacts.results)?;
    writeln!(
        stdout,
        "{} Finished in {}ms ({} bundles).",
        "●".bright_blue(),
        elapsed_ms.to_string().cyan(),
        ctx.artefacts.results.len().to_string().cyan()
    )?;
    stdout.flush()?;

    Ok(())
}
