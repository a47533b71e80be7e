//! Row and token grammar for the compleasm/BUSCO `full_table.tsv`.
//!
//! Data lines are tab-separated with at least [`MIN_FIELDS`] fields:
//! field 0 gene id, 1 status, 2 contig, 5 strand, 12 exon list. The exon
//! list is `|`-separated `start_end_strand` tokens with 1-based inclusive
//! genomic coordinates.

use crate::genome::LookupError;
use thiserror::Error;

pub const MIN_FIELDS: usize = 13;

/// The compleasm table header starts with this.
pub const HEADER_MARKER: &str = "Gene";
/// BUSCO tables carry `#` comment lines.
pub const COMMENT_MARKER: char = '#';

pub const SINGLE_STATUS: &str = "Single";

const GENE_ID_FIELD: usize = 0;
const STATUS_FIELD: usize = 1;
const CONTIG_FIELD: usize = 2;
const STRAND_FIELD: usize = 5;
const EXONS_FIELD: usize = 12;

/// Why a row produced no sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("row has {found} tab-separated fields, expected at least {}", MIN_FIELDS)]
    MalformedRow { found: usize },
    #[error("unexpected exon token '{token}'")]
    MalformedExonToken { token: String },
    #[error("exon token '{token}' is on strand '{exon_strand}' but the gene is on strand '{gene_strand}'")]
    StrandMismatch {
        token: String,
        exon_strand: String,
        gene_strand: String,
    },
    #[error("exon token '{token}': {source}")]
    ContigNotFound {
        token: String,
        #[source]
        source: LookupError,
    },
}

impl Rejection {
    /// Stable name of the rejection class, used in the record log.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::MalformedRow { .. } => "MalformedRow",
            Rejection::MalformedExonToken { .. } => "MalformedExonToken",
            Rejection::StrandMismatch { .. } => "StrandMismatch",
            Rejection::ContigNotFound { .. } => "ContigNotFound",
        }
    }

    /// True when the genome could not be read, as opposed to the row
    /// pointing somewhere the genome does not cover.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Rejection::ContigNotFound { source, .. } if source.is_fatal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Header,
    Data(&'a str),
}

/// Classify one raw table line. Only the line terminator is dropped from data
/// lines; a trailing tab still delimits an (empty) last field.
pub fn classify_line(line: &str) -> Line<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        Line::Blank
    } else if line.starts_with(HEADER_MARKER) || line.starts_with(COMMENT_MARKER) {
        Line::Header
    } else {
        Line::Data(line)
    }
}

/// Borrowed view of one data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneRow<'a> {
    pub gene_id: &'a str,
    pub status: &'a str,
    pub contig: &'a str,
    pub strand: &'a str,
    pub exons: &'a str,
}

impl<'a> GeneRow<'a> {
    pub fn parse(line: &'a str) -> Result<Self, Rejection> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(Rejection::MalformedRow { found: fields.len() });
        }
        Ok(Self {
            gene_id: fields[GENE_ID_FIELD],
            status: fields[STATUS_FIELD],
            contig: fields[CONTIG_FIELD],
            strand: fields[STRAND_FIELD],
            exons: fields[EXONS_FIELD],
        })
    }

    pub fn is_single(&self) -> bool {
        self.status == SINGLE_STATUS
    }

    pub fn is_reverse(&self) -> bool {
        self.strand == "-"
    }

    /// Parse every exon token, in file order.
    pub fn exon_tokens(&self) -> Result<Vec<ExonToken<'a>>, Rejection> {
        self.exons.split('|').map(ExonToken::parse).collect()
    }
}

/// One `start_end_strand` exon token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExonToken<'a> {
    /// 1-based, inclusive.
    pub start: u64,
    /// 1-based, inclusive.
    pub end: u64,
    pub strand: &'a str,
    pub raw: &'a str,
}

impl<'a> ExonToken<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, Rejection> {
        let malformed = || Rejection::MalformedExonToken {
            token: raw.to_string(),
        };
        let mut parts = raw.split('_');
        let (Some(start), Some(end), Some(strand), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let start = start.parse::<u64>().map_err(|_| malformed())?;
        let end = end.parse::<u64>().map_err(|_| malformed())?;
        Ok(Self { start, end, strand, raw })
    }

    /// 0-based half-open range covered by this exon. `None` when the token
    /// has no valid conversion (start of 0, or start past end).
    pub fn zero_based(&self) -> Option<std::ops::Range<u64>> {
        let start0 = self.start.checked_sub(1)?;
        (self.start <= self.end).then_some(start0..self.end)
    }
}
