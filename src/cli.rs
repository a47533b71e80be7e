use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "compleasm-cds",
    about = "Extract coding sequences of single-copy genes from a compleasm full table",
    version
)]
pub struct Args {
    /// Genome assembly FASTA (a .fai index is built next to it if missing)
    #[arg(value_name = "FASTA")]
    pub genome_fasta: PathBuf,

    /// compleasm/BUSCO full_table.tsv
    #[arg(value_name = "TABLE")]
    pub table: PathBuf,

    /// Species label, used as a column value and in output file names
    #[arg(value_name = "SPECIES")]
    pub species: String,

    /// Output directory [default: the table's directory]
    #[arg(short = 'o', long = "outdir", value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Number of threads (CPUs) to use
    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    pub threads: u8,

    /// Load the whole genome into memory instead of using the .fai index
    #[arg(long)]
    pub in_memory: bool,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    pub fn outdir(&self) -> PathBuf {
        match &self.outdir {
            Some(dir) => dir.clone(),
            None => self
                .table
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
