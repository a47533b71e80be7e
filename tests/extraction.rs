use compleasm_cds::{
    process_line, reverse_complement, FastaDb, LookupError, Rejection, RejectionRecord,
    RowOutcome,
};

// ── helpers ──────────────────────────────────────────────────────────────────

/// 100 `T`s, then `ACGTACGTAC` at 1-based 101..=110, then 40 `G`s.
fn short_contig() -> Vec<u8> {
    let mut seq = vec![b'T'; 100];
    seq.extend_from_slice(b"ACGTACGTAC");
    seq.extend(std::iter::repeat(b'G').take(40));
    seq
}

/// 600 `A`s with two marked exons at 1-based 100..=110 and 500..=510.
fn two_exon_contig() -> Vec<u8> {
    let mut seq = vec![b'A'; 600];
    seq[99..110].copy_from_slice(b"CCCCCGGGGGT");
    seq[499..510].copy_from_slice(b"TTTTTAAAAAC");
    seq
}

fn genome() -> FastaDb {
    FastaDb::from_sequences([
        ("chr1", short_contig()),
        ("chr2", two_exon_contig()),
        ("soft", b"ttttACGTacgtTTTT".to_vec()),
    ])
}

/// A 13-field table row.
fn row(gene: &str, status: &str, contig: &str, strand: &str, exons: &str) -> String {
    format!("{gene}\t{status}\t{contig}\t1\t2\t{strand}\t0.9\t100\t200\t300\t10\t0\t{exons}")
}

fn run(line: &str) -> RowOutcome {
    let mut genome = genome();
    process_line(line, 7, "gecko", &mut genome).expect("data line")
}

fn emitted(line: &str) -> Vec<u8> {
    match run(line) {
        RowOutcome::Emitted(record) => record.sequence,
        other => panic!("expected an emitted record, got {other:?}"),
    }
}

fn rejected(line: &str) -> RejectionRecord {
    match run(line) {
        RowOutcome::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

// ── coordinates and strand ───────────────────────────────────────────────────

#[test]
fn plus_strand_single_exon_is_taken_verbatim() {
    let seq = emitted(&row("g1", "Single", "chr1", "+", "101_110_+"));
    assert_eq!(seq, b"ACGTACGTAC");
}

#[test]
fn minus_strand_single_exon_is_reverse_complemented() {
    let seq = emitted(&row("g1", "Single", "chr1", "-", "101_110_-"));
    assert_eq!(seq, b"GTACGTACGT");
}

#[test]
fn emitted_record_carries_row_metadata() {
    match run(&row("10002at8457", "Single", "chr1", "+", "101_104_+")) {
        RowOutcome::Emitted(record) => {
            assert_eq!(record.gene_id, "10002at8457");
            assert_eq!(record.species, "gecko");
            assert_eq!(record.contig, "chr1");
            assert_eq!(record.strand, "+");
            assert_eq!(record.sequence, b"ACGT");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn first_and_last_base_of_contig_are_reachable() {
    assert_eq!(emitted(&row("g", "Single", "chr1", "+", "1_1_+")), b"T");
    assert_eq!(emitted(&row("g", "Single", "chr1", "+", "150_150_+")), b"G");
}

#[test]
fn minus_strand_exons_are_sorted_before_stitching() {
    let seq = emitted(&row("g2", "Single", "chr2", "-", "500_510_-|100_110_-"));
    assert_eq!(seq, b"GTTTTTAAAAAACCCCCGGGGG");

    // Stitching in file order and reverse-complementing gives something else.
    let mut naive = b"TTTTTAAAAAC".to_vec();
    naive.extend_from_slice(b"CCCCCGGGGGT");
    reverse_complement(&mut naive);
    assert_ne!(seq, naive);
}

#[test]
fn plus_strand_exon_order_in_file_does_not_matter() {
    let ascending = emitted(&row("g3", "Single", "chr2", "+", "100_110_+|500_510_+"));
    let descending = emitted(&row("g3", "Single", "chr2", "+", "500_510_+|100_110_+"));
    assert_eq!(ascending, b"CCCCCGGGGGTTTTTTAAAAAC");
    assert_eq!(ascending, descending);
}

#[test]
fn soft_masked_case_is_preserved() {
    assert_eq!(emitted(&row("g", "Single", "soft", "+", "3_10_+")), b"ttACGTac");
    assert_eq!(emitted(&row("g", "Single", "soft", "-", "3_10_-")), b"gtACGTaa");
}

#[test]
fn trailing_carriage_return_is_ignored() {
    let line = format!("{}\r\n", row("g1", "Single", "chr1", "+", "101_110_+"));
    assert_eq!(emitted(&line), b"ACGTACGTAC");
}

// ── rejections ───────────────────────────────────────────────────────────────

#[test]
fn plus_gene_with_minus_exon_is_rejected() {
    let rejection = rejected(&row("g4", "Single", "chr2", "+", "100_110_+|500_510_-"));
    assert_eq!(rejection.gene_id.as_deref(), Some("g4"));
    assert_eq!(rejection.line_no, 7);
    assert_eq!(rejection.reason.kind(), "StrandMismatch");
    assert_eq!(
        rejection.reason,
        Rejection::StrandMismatch {
            token: "500_510_-".to_string(),
            exon_strand: "-".to_string(),
            gene_strand: "+".to_string(),
        }
    );
}

#[test]
fn unknown_contig_is_rejected() {
    let rejection = rejected(&row("g5", "Single", "chrX", "+", "1_10_+"));
    assert_eq!(
        rejection.reason,
        Rejection::ContigNotFound {
            token: "1_10_+".to_string(),
            source: LookupError::NotFound { contig: "chrX".to_string() },
        }
    );
}

#[test]
fn range_past_contig_end_is_rejected() {
    let rejection = rejected(&row("g6", "Single", "chr1", "+", "145_151_+"));
    assert_eq!(rejection.reason.kind(), "ContigNotFound");
    match rejection.reason {
        Rejection::ContigNotFound {
            source: LookupError::OutOfRange { start, end, length, .. },
            ..
        } => assert_eq!((start, end, length), (144, 151, 150)),
        other => panic!("unexpected reason {other:?}"),
    }
}

#[test]
fn zero_start_is_rejected() {
    let rejection = rejected(&row("g7", "Single", "chr1", "+", "0_10_+"));
    assert!(matches!(
        rejection.reason,
        Rejection::ContigNotFound { source: LookupError::InvalidCoordinates { .. }, .. }
    ));
}

#[test]
fn malformed_exon_tokens_are_rejected() {
    for exons in ["101_110", "101_110_+_x", "abc_110_+", "101_-5_+", "", "101_110_+|"] {
        let rejection = rejected(&row("g8", "Single", "chr1", "+", exons));
        assert_eq!(rejection.reason.kind(), "MalformedExonToken", "exons {exons:?}");
    }
}

#[test]
fn any_bad_exon_suppresses_the_whole_gene() {
    let rejection = rejected(&row("g9", "Single", "chr2", "+", "100_110_+|900_910_+"));
    assert_eq!(rejection.reason.kind(), "ContigNotFound");
}

#[test]
fn short_row_is_malformed() {
    let rejection = rejected("g10\tSingle\tchr1\t1\t2\t+");
    assert_eq!(rejection.gene_id.as_deref(), Some("g10"));
    assert_eq!(rejection.reason, Rejection::MalformedRow { found: 6 });
    assert_eq!(rejection.line.as_deref(), Some("g10\tSingle\tchr1\t1\t2\t+"));
}

// ── skips ────────────────────────────────────────────────────────────────────

#[test]
fn non_single_status_is_skipped_without_lookup() {
    // The contig does not exist; a skipped row must never reach the genome.
    match run(&row("g11", "Duplicated", "nowhere", "+", "garbage")) {
        RowOutcome::SkippedNonSingle { gene_id, status } => {
            assert_eq!(gene_id, "g11");
            assert_eq!(status, "Duplicated");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn header_and_blank_lines_produce_nothing() {
    let mut genome = genome();
    for line in ["", "   ", "Gene\tStatus\tSequence", "# BUSCO version is: 5.4.3"] {
        assert!(process_line(line, 1, "gecko", &mut genome).is_none(), "line {line:?}");
    }
}

// ── reverse complement ───────────────────────────────────────────────────────

#[test]
fn reverse_complement_covers_iupac_codes() {
    let mut upper = b"ACGTRYSWKMBVDHN".to_vec();
    reverse_complement(&mut upper);
    assert_eq!(upper, b"NDHBVKMWSRYACGT");

    let mut lower = b"acgtryswkmbvdhn".to_vec();
    reverse_complement(&mut lower);
    assert_eq!(lower, b"ndhbvkmwsryacgt");
}

#[test]
fn reverse_complement_preserves_case_and_unknown_bytes() {
    let mut seq = b"AaRrYyNn".to_vec();
    reverse_complement(&mut seq);
    assert_eq!(seq, b"nNrRyYtT");

    let mut odd = b"X-*U".to_vec();
    reverse_complement(&mut odd);
    assert_eq!(odd, b"U*-X");
}
