//! Diagnostic comparison of extracted CDS against BUSCO
//! `single_copy_busco_sequences` files.
//!
//! Each BUSCO FASTA is matched to a CDS record by file stem, falling back to
//! the BUSCO header id. Sequences are compared uppercased. Equal-length pairs
//! get a position-wise identity; other pairs get a Ratcliff/Obershelp
//! similarity ratio, a plain string-similarity score with no alignment.

use crate::fasta::record_name;
use crate::types::{HashMap, HashMapExt};
use anyhow::{anyhow, bail, Context, Result};
use needletail::parse_fastx_file;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FASTA_EXTENSIONS: [&str; 5] = ["fa", "fasta", "fna", "fas", "faa"];

/// One row of the comparison CSV. `None` fields are written empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub busco_file: String,
    pub busco_key: String,
    pub busco_header_id: String,
    pub found_in_compleasm: &'static str,
    pub exact_match: Option<&'static str>,
    pub len_busco: usize,
    pub len_compleasm: Option<usize>,
    pub mismatches_same_len: Option<usize>,
    pub identity_same_len: Option<String>,
    pub approx_similarity_if_diff_len: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub scanned: usize,
    pub matched: usize,
    pub exact: usize,
    pub missing: usize,
}

/// Read a multi-FASTA into `id -> uppercased sequence`. The id is the header
/// up to the first whitespace; the first record wins on duplicates.
pub fn read_fasta_map(path: &Path) -> Result<HashMap<String, Vec<u8>>> {
    let mut reader = parse_fastx_file(path)
        .map_err(|e| anyhow!("failed to open FASTA {}: {}", path.display(), e))?;
    let mut seqs: HashMap<String, Vec<u8>> = HashMap::new();

    while let Some(result) = reader.next() {
        let record = result
            .map_err(|e| anyhow!("failed to parse FASTA record in {}: {}", path.display(), e))?;
        let id = record_name(record.id());
        if seqs.contains_key(&id) {
            tracing::warn!(id = %id, fasta = %path.display(), "duplicate FASTA id, keeping the first");
            continue;
        }
        seqs.insert(id, record.seq().to_ascii_uppercase());
    }

    Ok(seqs)
}

/// First record of a FASTA file as `(id, uppercased sequence)`.
pub fn read_first_record(path: &Path) -> Result<(String, Vec<u8>)> {
    let mut reader = parse_fastx_file(path)
        .map_err(|e| anyhow!("failed to open FASTA {}: {}", path.display(), e))?;
    let record = reader
        .next()
        .ok_or_else(|| anyhow!("no FASTA records found in {}", path.display()))?
        .map_err(|e| anyhow!("failed to parse FASTA record in {}: {}", path.display(), e))?;
    Ok((record_name(record.id()), record.seq().to_ascii_uppercase()))
}

/// FASTA files directly inside `dir`, sorted by path.
pub fn busco_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        let is_fasta = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FASTA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_fasta {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Compare one BUSCO sequence against its CDS counterpart, if any.
pub fn compare_sequences(
    busco_file: &str,
    busco_key: &str,
    busco_header_id: &str,
    busco_seq: &[u8],
    cds_seq: Option<&[u8]>,
) -> ComparisonRow {
    let mut row = ComparisonRow {
        busco_file: busco_file.to_string(),
        busco_key: busco_key.to_string(),
        busco_header_id: busco_header_id.to_string(),
        found_in_compleasm: "NO",
        exact_match: None,
        len_busco: busco_seq.len(),
        len_compleasm: None,
        mismatches_same_len: None,
        identity_same_len: None,
        approx_similarity_if_diff_len: None,
    };
    let Some(cds_seq) = cds_seq else {
        return row;
    };

    row.found_in_compleasm = "YES";
    row.exact_match = Some(if cds_seq == busco_seq { "YES" } else { "NO" });
    row.len_compleasm = Some(cds_seq.len());
    if cds_seq.len() == busco_seq.len() {
        let mismatches = cds_seq
            .iter()
            .zip(busco_seq)
            .filter(|(a, b)| a != b)
            .count();
        let identity = if cds_seq.is_empty() {
            0.0
        } else {
            (cds_seq.len() - mismatches) as f64 / cds_seq.len() as f64
        };
        row.mismatches_same_len = Some(mismatches);
        row.identity_same_len = Some(format!("{identity:.6}"));
    } else {
        row.approx_similarity_if_diff_len =
            Some(format!("{:.6}", similarity_ratio(cds_seq, busco_seq)));
    }
    row
}

/// Compare every BUSCO file in `busco_dir` against the CDS FASTA.
pub fn compare_dir(cds_fasta: &Path, busco_dir: &Path) -> Result<(Vec<ComparisonRow>, ComparisonSummary)> {
    let cds = read_fasta_map(cds_fasta)?;
    let files = busco_files(busco_dir)?;

    let mut summary = ComparisonSummary::default();
    let mut rows = Vec::with_capacity(files.len());

    for path in &files {
        summary.scanned += 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (header_id, busco_seq) = read_first_record(path)?;

        let cds_seq = cds.get(&key).or_else(|| cds.get(&header_id));
        let row = compare_sequences(&file_name, &key, &header_id, &busco_seq, cds_seq.map(Vec::as_slice));
        match (row.found_in_compleasm, row.exact_match) {
            ("NO", _) => summary.missing += 1,
            (_, Some("YES")) => {
                summary.matched += 1;
                summary.exact += 1;
            }
            _ => summary.matched += 1,
        }
        rows.push(row);
    }

    Ok((rows, summary))
}

pub fn write_csv(rows: &[ComparisonRow], out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Ratcliff/Obershelp similarity: `2 * M / (|a| + |b|)`, where `M` counts
/// characters in recursively found longest common blocks. Two empty inputs
/// are identical.
pub fn similarity_ratio(a: &[u8], b: &[u8]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(a, b) as f64 / total as f64
}

fn matching_characters(a: &[u8], b: &[u8]) -> usize {
    let mut matched = 0;
    let mut stack = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = stack.pop() {
        let (i, j, k) = longest_match(&a[alo..ahi], &b[blo..bhi]);
        if k == 0 {
            continue;
        }
        matched += k;
        let (i, j) = (alo + i, blo + j);
        stack.push((alo, i, blo, j));
        stack.push((i + k, ahi, j + k, bhi));
    }
    matched
}

/// Longest common substring as `(start in a, start in b, length)`; earliest
/// in `a` on ties.
fn longest_match(a: &[u8], b: &[u8]) -> (usize, usize, usize) {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    let mut best = (0, 0, 0);
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            cur[j] = if a[i - 1] == b[j - 1] { prev[j - 1] + 1 } else { 0 };
            if cur[j] > best.2 {
                best = (i - cur[j], j - cur[j], cur[j]);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}
