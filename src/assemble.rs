//! Per-row CDS assembly: validate, order exons, stitch, strand-correct.

use crate::genome::{LookupError, SequenceSource};
use crate::table::{classify_line, ExonToken, GeneRow, Line, Rejection};
use crate::types::LineNo;

/// A successfully assembled coding sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdsRecord {
    pub gene_id: String,
    pub species: String,
    pub contig: String,
    pub strand: String,
    pub sequence: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionRecord {
    /// Absent only when the row was too short to carry one.
    pub gene_id: Option<String>,
    pub line_no: LineNo,
    pub reason: Rejection,
    /// The offending line, kept for `MalformedRow` only.
    pub line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Emitted(CdsRecord),
    SkippedNonSingle { gene_id: String, status: String },
    Rejected(RejectionRecord),
}

/// Process one raw table line. Returns `None` for blank and header lines.
pub fn process_line<S>(line: &str, line_no: LineNo, species: &str, genome: &mut S) -> Option<RowOutcome>
where
    S: SequenceSource + ?Sized,
{
    match classify_line(line) {
        Line::Blank | Line::Header => None,
        Line::Data(data) => Some(process_row(data, line_no, species, genome)),
    }
}

/// Process one data line (already known not to be blank or a header).
pub fn process_row<S>(data: &str, line_no: LineNo, species: &str, genome: &mut S) -> RowOutcome
where
    S: SequenceSource + ?Sized,
{
    let row = match GeneRow::parse(data) {
        Ok(row) => row,
        Err(reason) => {
            let gene_id = data
                .split('\t')
                .next()
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            return RowOutcome::Rejected(RejectionRecord {
                gene_id,
                line_no,
                reason,
                line: Some(data.to_string()),
            });
        }
    };

    if !row.is_single() {
        return RowOutcome::SkippedNonSingle {
            gene_id: row.gene_id.to_string(),
            status: row.status.to_string(),
        };
    }

    match assemble(&row, genome) {
        Ok(sequence) => RowOutcome::Emitted(CdsRecord {
            gene_id: row.gene_id.to_string(),
            species: species.to_string(),
            contig: row.contig.to_string(),
            strand: row.strand.to_string(),
            sequence,
        }),
        Err(reason) => RowOutcome::Rejected(RejectionRecord {
            gene_id: Some(row.gene_id.to_string()),
            line_no,
            reason,
            line: None,
        }),
    }
}

/// Stitch the exons of `row` and strand-correct the result.
///
/// Tokens are sorted ascending by start before stitching, whatever the
/// strand or file order, so the buffer is always in forward genomic order.
/// Minus-strand genes are then reverse-complemented as a whole. Nothing is
/// returned if any token fails.
pub fn assemble<S>(row: &GeneRow<'_>, genome: &mut S) -> Result<Vec<u8>, Rejection>
where
    S: SequenceSource + ?Sized,
{
    let mut tokens = row.exon_tokens()?;
    tokens.sort_by_key(|token| token.start);

    let mut sequence = Vec::new();
    for token in &tokens {
        sequence.extend_from_slice(&fetch_exon(row, token, genome)?);
    }

    if row.is_reverse() {
        reverse_complement(&mut sequence);
    }
    Ok(sequence)
}

fn fetch_exon<S>(row: &GeneRow<'_>, token: &ExonToken<'_>, genome: &mut S) -> Result<Vec<u8>, Rejection>
where
    S: SequenceSource + ?Sized,
{
    if token.strand != row.strand {
        return Err(Rejection::StrandMismatch {
            token: token.raw.to_string(),
            exon_strand: token.strand.to_string(),
            gene_strand: row.strand.to_string(),
        });
    }
    let not_found = |source: LookupError| Rejection::ContigNotFound {
        token: token.raw.to_string(),
        source,
    };
    let range = token.zero_based().ok_or_else(|| {
        not_found(LookupError::InvalidCoordinates {
            contig: row.contig.to_string(),
            start: token.start,
            end: token.end,
        })
    })?;
    let expected = range.end - range.start;
    let (start, end) = (range.start, range.end);
    let seq = genome.fetch(row.contig, range).map_err(not_found)?;
    if seq.len() as u64 != expected {
        return Err(not_found(LookupError::Truncated {
            contig: row.contig.to_string(),
            start,
            end,
            returned: seq.len(),
        }));
    }
    Ok(seq)
}

/// IUPAC complement, case preserved. Bytes outside the table pass through.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'r' => b'y',
        b'y' => b'r',
        b'k' => b'm',
        b'm' => b'k',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        // S, W, N and anything unknown map to themselves
        other => other,
    }
}

pub fn reverse_complement(seq: &mut [u8]) {
    seq.reverse();
    for base in seq.iter_mut() {
        *base = complement(*base);
    }
}
