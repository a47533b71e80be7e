//! compleasm-cds: stitch spliced coding sequences of single-copy orthologs
//! out of a genome assembly, driven by a compleasm/BUSCO `full_table.tsv`.
//!
//! # Library usage
//!
//! ```no_run
//! use compleasm_cds::{FastaDb, RowOutcome, process_line};
//!
//! let mut genome = FastaDb::from_sequences([("chr1", b"ACGTACGTACGT".to_vec())]);
//! let line = "g1\tSingle\tchr1\t0\t0\t+\t0\t0\t0\t0\t0\t0\t1_4_+";
//! match process_line(line, 1, "my_species", &mut genome) {
//!     Some(RowOutcome::Emitted(record)) => assert_eq!(record.sequence, b"ACGT"),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

mod types;

pub mod assemble;
pub mod cli;
pub mod compare;
pub mod fasta;
pub mod genome;
pub mod output;
pub mod pipeline;
pub mod table;

// Flat re-exports for the most commonly used public types.
pub use assemble::{
    assemble, process_line, process_row, reverse_complement, CdsRecord, RejectionRecord,
    RowOutcome,
};
pub use fasta::FastaDb;
pub use genome::{GenomeIndex, GenomeSource, IndexError, LookupError, SequenceSource};
pub use output::{OutputPaths, Sinks};
pub use pipeline::Stats;
pub use table::{ExonToken, GeneRow, Rejection};
pub use types::{LineNo, Pos0};
