use anyhow::Result;
use clap::Parser;
use compleasm_cds::compare;
use mimalloc::MiMalloc;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "compare-busco",
    about = "Compare extracted CDS FASTA records to BUSCO single-copy sequences",
    version
)]
struct Args {
    /// CDS FASTA written by compleasm-cds
    #[arg(long = "cds-fasta", value_name = "FASTA")]
    cds_fasta: PathBuf,

    /// BUSCO single_copy_busco_sequences directory
    #[arg(long = "busco-dir", value_name = "DIR")]
    busco_dir: PathBuf,

    /// Comparison report to write
    #[arg(long = "out-csv", value_name = "CSV")]
    out_csv: PathBuf,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.quiet { "warn" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (rows, summary) = compare::compare_dir(&args.cds_fasta, &args.busco_dir)?;
    compare::write_csv(&rows, &args.out_csv)?;

    tracing::info!(
        scanned = summary.scanned,
        matched = summary.matched,
        exact = summary.exact,
        missing = summary.missing,
        report = %args.out_csv.display(),
        "compare-busco: done"
    );
    Ok(())
}
