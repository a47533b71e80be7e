use crate::assemble::{CdsRecord, RejectionRecord, RowOutcome};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const TSV_HEADER: [&str; 5] = ["Busco ID", "species", "location", "strand", "sequence"];

/// Output file locations for one species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub tsv: PathBuf,
    pub fasta: PathBuf,
    pub records: PathBuf,
}

impl OutputPaths {
    pub fn new(outdir: &Path, species: &str) -> Self {
        Self {
            tsv: outdir.join(format!("{species}_cds_compleasm.tsv")),
            fasta: outdir.join(format!("{species}_cds_compleasm.fasta")),
            records: outdir.join(format!("{species}_cds_compleasm_records.txt")),
        }
    }
}

/// TSV report, FASTA file and record log for one run.
pub struct Sinks<W: Write> {
    tsv: csv::Writer<W>,
    fasta: W,
    log: W,
}

impl Sinks<BufWriter<File>> {
    pub fn create(paths: &OutputPaths) -> Result<Self> {
        let open = |path: &Path| -> Result<BufWriter<File>> {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(BufWriter::new(file))
        };
        Self::new(open(&paths.tsv)?, open(&paths.fasta)?, open(&paths.records)?)
    }
}

impl<W: Write> Sinks<W> {
    /// Wrap the three writers and write the TSV header and run timestamp.
    pub fn new(tsv: W, fasta: W, mut log: W) -> Result<Self> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(tsv);
        tsv.write_record(TSV_HEADER)?;
        writeln!(log, "Time is {}", chrono::Local::now())?;
        Ok(Self { tsv, fasta, log })
    }

    pub fn write_outcome(&mut self, outcome: &RowOutcome) -> Result<()> {
        match outcome {
            RowOutcome::Emitted(record) => self.write_record(record),
            RowOutcome::SkippedNonSingle { gene_id, status } => {
                tracing::debug!(gene_id = %gene_id, status = %status, "skipping non-single gene");
                writeln!(self.log, "{gene_id} is {status}.")?;
                Ok(())
            }
            RowOutcome::Rejected(rejection) => self.write_rejection(rejection),
        }
    }

    fn write_record(&mut self, record: &CdsRecord) -> Result<()> {
        self.tsv.write_record([
            record.gene_id.as_bytes(),
            record.species.as_bytes(),
            record.contig.as_bytes(),
            record.strand.as_bytes(),
            record.sequence.as_slice(),
        ])?;
        self.fasta.write_all(b">")?;
        self.fasta.write_all(record.gene_id.as_bytes())?;
        self.fasta.write_all(b"\n")?;
        self.fasta.write_all(&record.sequence)?;
        self.fasta.write_all(b"\n")?;
        Ok(())
    }

    fn write_rejection(&mut self, rejection: &RejectionRecord) -> Result<()> {
        let gene_id = rejection.gene_id.as_deref().unwrap_or("<unknown>");
        tracing::warn!(
            gene_id,
            line = rejection.line_no,
            kind = rejection.reason.kind(),
            "{}",
            rejection.reason
        );
        write!(
            self.log,
            "WARNING: line {}: {}: {}: {}",
            rejection.line_no,
            gene_id,
            rejection.reason.kind(),
            rejection.reason
        )?;
        if let Some(line) = &rejection.line {
            write!(self.log, ": {line}")?;
        }
        writeln!(self.log)?;
        Ok(())
    }

    /// Flush everything and hand back the underlying writers.
    pub fn finish(self) -> Result<(W, W, W)> {
        let Self { tsv, mut fasta, mut log } = self;
        let tsv = tsv
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush TSV report: {}", e.error()))?;
        fasta.flush()?;
        log.flush()?;
        Ok((tsv, fasta, log))
    }
}
