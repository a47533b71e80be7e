use crate::genome::{check_range, IndexError, LookupError, SequenceSource};
use crate::types::{HashMap, HashMapExt, Pos0};
use needletail::parse_fastx_file;
use std::ops::Range;
use std::path::Path;

/// Whole assembly held in memory, keyed by contig name.
#[derive(Debug, Default)]
pub struct FastaDb {
    seqs: HashMap<String, Vec<u8>>,
}

impl FastaDb {
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let load_err = |message: String| IndexError::Load {
            path: path.to_path_buf(),
            message,
        };
        let mut reader = parse_fastx_file(path).map_err(|e| load_err(e.to_string()))?;
        let mut seqs: HashMap<String, Vec<u8>> = HashMap::new();

        while let Some(result) = reader.next() {
            let record = result.map_err(|e| load_err(e.to_string()))?;
            let name = record_name(record.id());
            if seqs.contains_key(&name) {
                return Err(IndexError::DuplicateContig {
                    path: path.to_path_buf(),
                    contig: name,
                });
            }
            seqs.insert(name, record.seq().to_vec());
        }

        Ok(Self { seqs })
    }

    /// Build from `(name, sequence)` pairs.
    pub fn from_sequences<N, S, I>(sequences: I) -> Self
    where
        N: Into<String>,
        S: Into<Vec<u8>>,
        I: IntoIterator<Item = (N, S)>,
    {
        let seqs = sequences
            .into_iter()
            .map(|(name, seq)| (name.into(), seq.into()))
            .collect();
        Self { seqs }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn get_slice(&self, contig: &str, range: Range<Pos0>) -> Result<&[u8], LookupError> {
        let seq = self.seqs.get(contig).ok_or_else(|| LookupError::NotFound {
            contig: contig.to_string(),
        })?;
        check_range(contig, &range, seq.len() as u64)?;
        Ok(&seq[range.start as usize..range.end as usize])
    }
}

impl SequenceSource for &FastaDb {
    fn fetch(&mut self, contig: &str, range: Range<Pos0>) -> Result<Vec<u8>, LookupError> {
        self.get_slice(contig, range).map(<[u8]>::to_vec)
    }
}

impl SequenceSource for FastaDb {
    fn fetch(&mut self, contig: &str, range: Range<Pos0>) -> Result<Vec<u8>, LookupError> {
        self.get_slice(contig, range).map(<[u8]>::to_vec)
    }
}

/// Contig name as the `.fai` sees it: the header up to the first whitespace.
pub(crate) fn record_name(id: &[u8]) -> String {
    let end = id
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(id.len());
    String::from_utf8_lossy(&id[..end]).into_owned()
}
