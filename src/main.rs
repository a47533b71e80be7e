use anyhow::{Context, Result};
use clap::Parser;
use compleasm_cds::{cli, genome, output, pipeline};
use mimalloc::MiMalloc;
use std::fs::File;
use std::io::BufReader;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            if args.quiet {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let genome = genome::GenomeSource::open(&args.genome_fasta, args.in_memory)
        .with_context(|| format!("cannot index genome {}", args.genome_fasta.display()))?;

    let table = File::open(&args.table)
        .with_context(|| format!("failed to open gene table {}", args.table.display()))?;

    let outdir = args.outdir();
    std::fs::create_dir_all(&outdir)
        .with_context(|| format!("failed to create output directory {}", outdir.display()))?;
    let paths = output::OutputPaths::new(&outdir, &args.species);
    let mut sinks = output::Sinks::create(&paths)?;

    let stats = pipeline::run(
        BufReader::new(table),
        &args.species,
        &genome,
        &mut sinks,
        args.threads.max(1) as usize,
    )?;
    sinks.finish()?;

    tracing::info!(
        data_rows = stats.data_rows,
        emitted = stats.emitted,
        skipped_non_single = stats.skipped_non_single,
        rejected = stats.rejected,
        tsv = %paths.tsv.display(),
        fasta = %paths.fasta.display(),
        records = %paths.records.display(),
        "compleasm-cds: processing complete"
    );
    Ok(())
}
