use crate::assemble::{process_row, RowOutcome};
use crate::genome::{GenomeSource, SequenceSource};
use crate::output::Sinks;
use crate::table::{classify_line, Line};
use crate::types::LineNo;
use anyhow::{bail, Result};
use crossfire::mpmc;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::thread;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total_lines: u64,
    pub header_lines: u64,
    pub data_rows: u64,
    pub emitted: u64,
    pub skipped_non_single: u64,
    pub rejected: u64,
}

impl Stats {
    fn count(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Emitted(_) => self.emitted += 1,
            RowOutcome::SkippedNonSingle { .. } => self.skipped_non_single += 1,
            RowOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Run the extraction over every line of `table`, writing outcomes to
/// `sinks` in input order. With `threads > 1` rows are assembled by a worker
/// pool; output order and content are unchanged.
pub fn run<R, W>(
    table: R,
    species: &str,
    genome: &GenomeSource,
    sinks: &mut Sinks<W>,
    threads: usize,
) -> Result<Stats>
where
    R: BufRead,
    W: Write,
{
    if threads > 1 {
        run_parallel(table, species, genome, sinks, threads)
    } else {
        let mut handle = genome.handle()?;
        run_sequential(table, species, handle.as_mut(), sinks)
    }
}

/// Single-threaded pass: each row is finished before the next is read.
pub fn run_sequential<R, W, S>(
    table: R,
    species: &str,
    genome: &mut S,
    sinks: &mut Sinks<W>,
) -> Result<Stats>
where
    R: BufRead,
    W: Write,
    S: SequenceSource + ?Sized,
{
    let mut stats = Stats::default();
    for (idx, line) in table.lines().enumerate() {
        let line = line?;
        stats.total_lines += 1;
        let Some(data) = data_line(&line, &mut stats) else {
            continue;
        };
        let outcome = process_row(data, idx + 1, species, genome);
        emit(&outcome, &mut stats, sinks)?;
    }
    Ok(stats)
}

struct WorkItem {
    idx: usize,
    line_no: LineNo,
    line: String,
}

struct ResultItem {
    idx: usize,
    outcome: RowOutcome,
}

fn run_parallel<R, W>(
    table: R,
    species: &str,
    genome: &GenomeSource,
    sinks: &mut Sinks<W>,
    threads: usize,
) -> Result<Stats>
where
    R: BufRead,
    W: Write,
{
    crossfire::detect_backoff_cfg();
    let worker_count = threads;
    let cap = worker_count.saturating_mul(4).max(8);
    let (tx_work, rx_work) = mpmc::bounded_blocking::<WorkItem>(cap);
    let (tx_res, rx_res) = mpmc::unbounded_blocking::<ResultItem>();

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        handles.push(genome.handle()?);
    }

    let mut stats = Stats::default();
    let mut row_idx: usize = 0;

    thread::scope(|scope| -> Result<()> {
        for mut handle in handles {
            let rx_work = rx_work.clone();
            let tx_res = tx_res.clone();
            scope.spawn(move || {
                while let Ok(item) = rx_work.recv() {
                    let outcome = process_row(&item.line, item.line_no, species, handle.as_mut());
                    let _ = tx_res.send(ResultItem { idx: item.idx, outcome });
                }
            });
        }
        drop(tx_res);
        drop(rx_work);

        for (idx, line) in table.lines().enumerate() {
            let line = line?;
            stats.total_lines += 1;
            let Some(data) = data_line(&line, &mut stats) else {
                continue;
            };
            tx_work.send(WorkItem {
                idx: row_idx,
                line_no: idx + 1,
                line: data.to_string(),
            })
            .map_err(|_| anyhow::anyhow!("work channel closed"))?;
            row_idx += 1;
        }

        drop(tx_work);

        let mut pending: BTreeMap<usize, RowOutcome> = BTreeMap::new();
        let mut next_idx = 0usize;

        while next_idx < row_idx {
            let res = rx_res
                .recv()
                .map_err(|_| anyhow::anyhow!("worker result channel closed"))?;
            pending.insert(res.idx, res.outcome);
            while let Some(outcome) = pending.remove(&next_idx) {
                emit(&outcome, &mut stats, sinks)?;
                next_idx += 1;
            }
        }

        Ok(())
    })?;

    Ok(stats)
}

/// Count and write one outcome. A row that failed because the genome could
/// not be read ends the run instead of being logged as a rejection.
fn emit<W: Write>(outcome: &RowOutcome, stats: &mut Stats, sinks: &mut Sinks<W>) -> Result<()> {
    if let RowOutcome::Rejected(rejection) = outcome {
        if rejection.reason.is_fatal() {
            bail!(
                "line {}: {}: {}",
                rejection.line_no,
                rejection.gene_id.as_deref().unwrap_or("<unknown>"),
                rejection.reason
            );
        }
    }
    stats.count(outcome);
    sinks.write_outcome(outcome)
}

fn data_line<'a>(line: &'a str, stats: &mut Stats) -> Option<&'a str> {
    match classify_line(line) {
        Line::Blank => None,
        Line::Header => {
            stats.header_lines += 1;
            None
        }
        Line::Data(data) => {
            stats.data_rows += 1;
            Some(data)
        }
    }
}
