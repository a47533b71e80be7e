//! Random access to contig subsequences of a genome assembly.
//!
//! Coordinates at this boundary are 0-based, half-open `[start, end)`.
//! Callers convert from the 1-based inclusive table convention with
//! `start0 = start1 - 1`, `end0 = end1`.

use crate::fasta::FastaDb;
use crate::types::{HashMap, HashMapExt, Pos0};
use noodles::core::{Position, Region};
use noodles::fasta::{self, fai};
use std::fs::File;
use std::io::{self, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A contig lookup that could not be served. Recoverable; the caller decides
/// what to do with the owning gene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("contig '{contig}' not found in genome")]
    NotFound { contig: String },
    #[error("range {start}..{end} is outside contig '{contig}' (length {length})")]
    OutOfRange {
        contig: String,
        start: Pos0,
        end: Pos0,
        length: u64,
    },
    #[error("1-based range {start}-{end} on contig '{contig}' is not a valid interval")]
    InvalidCoordinates { contig: String, start: u64, end: u64 },
    #[error("failed to read contig '{contig}': {message}")]
    Read { contig: String, message: String },
    #[error("read {returned} bases for range {start}..{end} of contig '{contig}'")]
    Truncated {
        contig: String,
        start: Pos0,
        end: Pos0,
        returned: usize,
    },
}

impl LookupError {
    /// The genome itself could not be read as indexed. Unlike a bad
    /// coordinate this says nothing about the gene, so the run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LookupError::Read { .. } | LookupError::Truncated { .. })
    }
}

/// The assembly could not be opened or indexed. Fatal for the run.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("genome FASTA {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("failed to read FASTA index {}: {source}", .path.display())]
    ReadIndex { path: PathBuf, source: io::Error },
    #[error("failed to index genome FASTA {}: {source}", .path.display())]
    BuildIndex { path: PathBuf, source: io::Error },
    #[error("failed to write FASTA index {}: {source}", .path.display())]
    WriteIndex { path: PathBuf, source: io::Error },
    #[error("failed to load genome FASTA {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },
    #[error("contig name '{contig}' occurs more than once in {}", .path.display())]
    DuplicateContig { path: PathBuf, contig: String },
}

/// Anything that can hand out contig subsequences by 0-based half-open range.
pub trait SequenceSource {
    fn fetch(&mut self, contig: &str, range: Range<Pos0>) -> Result<Vec<u8>, LookupError>;
}

/// Check `range` against a contig of `length` bases.
pub(crate) fn check_range(contig: &str, range: &Range<Pos0>, length: u64) -> Result<(), LookupError> {
    if range.start > range.end || range.end > length {
        return Err(LookupError::OutOfRange {
            contig: contig.to_string(),
            start: range.start,
            end: range.end,
            length,
        });
    }
    Ok(())
}

/// A genome FASTA with its `.fai` positional index.
#[derive(Debug)]
pub struct GenomeIndex {
    path: PathBuf,
    index: fai::Index,
    lengths: HashMap<String, u64>,
}

impl GenomeIndex {
    /// Open `path`, reading `<path>.fai` when present and building (and
    /// writing) it otherwise.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if !path.is_file() {
            return Err(IndexError::Missing(path.to_path_buf()));
        }
        let fai_path = fai_path(path);

        if fai_path.is_file() {
            let file = File::open(&fai_path).map_err(|source| IndexError::ReadIndex {
                path: fai_path.clone(),
                source,
            })?;
            let index = fai::io::Reader::new(BufReader::new(file))
                .read_index()
                .map_err(|source| IndexError::ReadIndex {
                    path: fai_path.clone(),
                    source,
                })?;
            let lengths = contig_lengths(&index, path)?;
            return Ok(Self {
                path: path.to_path_buf(),
                index,
                lengths,
            });
        }

        tracing::info!(fasta = %path.display(), "building FASTA index");
        let index = fasta::fs::index(path).map_err(|source| IndexError::BuildIndex {
            path: path.to_path_buf(),
            source,
        })?;
        // Duplicates are rejected before anything is written.
        let lengths = contig_lengths(&index, path)?;
        write_index_atomically(&index, &fai_path)?;

        Ok(Self {
            path: path.to_path_buf(),
            index,
            lengths,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contig_count(&self) -> usize {
        self.lengths.len()
    }

    pub fn contig_length(&self, contig: &str) -> Option<u64> {
        self.lengths.get(contig).copied()
    }

    /// A seekable handle over the assembly. Handles share nothing but the
    /// index, so one per worker is fine.
    pub fn reader(&self) -> io::Result<GenomeReader<'_>> {
        let file = File::open(&self.path)?;
        let inner = fasta::io::IndexedReader::new(BufReader::new(file), self.index.clone());
        Ok(GenomeReader { genome: self, inner })
    }
}

pub struct GenomeReader<'a> {
    genome: &'a GenomeIndex,
    inner: fasta::io::IndexedReader<BufReader<File>>,
}

impl SequenceSource for GenomeReader<'_> {
    fn fetch(&mut self, contig: &str, range: Range<Pos0>) -> Result<Vec<u8>, LookupError> {
        let length = self
            .genome
            .contig_length(contig)
            .ok_or_else(|| LookupError::NotFound {
                contig: contig.to_string(),
            })?;
        check_range(contig, &range, length)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let read_err = |message: String| LookupError::Read {
            contig: contig.to_string(),
            message,
        };
        // Region intervals are 1-based inclusive.
        let start = Position::try_from(range.start as usize + 1).map_err(|e| read_err(e.to_string()))?;
        let end = Position::try_from(range.end as usize).map_err(|e| read_err(e.to_string()))?;
        let region = Region::new(contig, start..=end);
        let record = self
            .inner
            .query(&region)
            .map_err(|e| read_err(e.to_string()))?;
        Ok(record.sequence().as_ref().to_vec())
    }
}

/// Where sequences come from for a run: the indexed FASTA, or the whole
/// assembly held in memory.
#[derive(Debug)]
pub enum GenomeSource {
    Indexed(GenomeIndex),
    InMemory(FastaDb),
}

impl GenomeSource {
    pub fn open(path: &Path, in_memory: bool) -> Result<Self, IndexError> {
        let source = if in_memory {
            if !path.is_file() {
                return Err(IndexError::Missing(path.to_path_buf()));
            }
            GenomeSource::InMemory(FastaDb::load(path)?)
        } else {
            GenomeSource::Indexed(GenomeIndex::open(path)?)
        };
        tracing::info!(
            fasta = %path.display(),
            contigs = source.contig_count(),
            in_memory,
            "genome ready"
        );
        Ok(source)
    }

    pub fn contig_count(&self) -> usize {
        match self {
            GenomeSource::Indexed(index) => index.contig_count(),
            GenomeSource::InMemory(db) => db.len(),
        }
    }

    /// A fresh lookup handle. Each worker thread takes its own.
    pub fn handle(&self) -> io::Result<Box<dyn SequenceSource + Send + '_>> {
        let handle: Box<dyn SequenceSource + Send + '_> = match self {
            GenomeSource::Indexed(index) => Box::new(index.reader()?),
            GenomeSource::InMemory(db) => Box::new(db),
        };
        Ok(handle)
    }
}

/// Contig lengths by name. Lookups go by name, so a repeated name would
/// make the index and the reader disagree on which record is meant.
fn contig_lengths(index: &fai::Index, path: &Path) -> Result<HashMap<String, u64>, IndexError> {
    let records: &[fai::Record] = index.as_ref();
    let mut lengths: HashMap<String, u64> = HashMap::with_capacity(records.len());
    for record in records {
        let name = String::from_utf8_lossy(record.name().as_ref()).into_owned();
        if lengths.contains_key(&name) {
            return Err(IndexError::DuplicateContig {
                path: path.to_path_buf(),
                contig: name,
            });
        }
        lengths.insert(name, record.length());
    }
    Ok(lengths)
}

/// Write the index next to the FASTA via a temporary file, so a failed write
/// never leaves a truncated `.fai` for the next run to trust.
fn write_index_atomically(index: &fai::Index, fai_path: &Path) -> Result<(), IndexError> {
    let write_err = |source: io::Error| IndexError::WriteIndex {
        path: fai_path.to_path_buf(),
        source,
    };
    let dir = fai_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    fai::io::Writer::new(&mut tmp)
        .write_index(index)
        .map_err(write_err)?;
    tmp.persist(fai_path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn fai_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".fai");
    PathBuf::from(name)
}
