use compleasm_cds::table::{classify_line, Line, MIN_FIELDS};
use compleasm_cds::{ExonToken, GeneRow, Rejection};

const ROW: &str = "1003at8457\tSingle\tscaffold_12\t1500\t9800\t-\t0.97\t2100\t700\t812.5\tpass\t3\t9800_9500_-|4000_3800_-|1800_1500_-";

#[test]
fn gene_row_picks_fixed_fields() {
    let row = GeneRow::parse(ROW).expect("well-formed row");
    assert_eq!(row.gene_id, "1003at8457");
    assert_eq!(row.status, "Single");
    assert_eq!(row.contig, "scaffold_12");
    assert_eq!(row.strand, "-");
    assert_eq!(row.exons, "9800_9500_-|4000_3800_-|1800_1500_-");
    assert!(row.is_single());
    assert!(row.is_reverse());
}

#[test]
fn gene_row_requires_thirteen_fields() {
    let twelve = vec!["x"; MIN_FIELDS - 1].join("\t");
    assert_eq!(
        GeneRow::parse(&twelve),
        Err(Rejection::MalformedRow { found: MIN_FIELDS - 1 })
    );

    let thirteen = vec!["x"; MIN_FIELDS].join("\t");
    assert!(GeneRow::parse(&thirteen).is_ok());
}

#[test]
fn extra_fields_are_tolerated() {
    let line = format!("{ROW}\textra\tcolumns");
    let row = GeneRow::parse(&line).expect("row with extra fields");
    assert_eq!(row.exons, "9800_9500_-|4000_3800_-|1800_1500_-");
}

#[test]
fn status_match_is_exact() {
    for status in ["single", "Single ", "Duplicated", "Fragmented", "Missing", ""] {
        let line = ROW.replacen("Single", status, 1);
        let row = GeneRow::parse(&line).expect("row");
        assert!(!row.is_single(), "status {status:?}");
    }
}

#[test]
fn exon_tokens_keep_file_order() {
    let row = GeneRow::parse(ROW).expect("row");
    let starts: Vec<u64> = row
        .exon_tokens()
        .expect("tokens")
        .iter()
        .map(|t| t.start)
        .collect();
    assert_eq!(starts, vec![9800, 4000, 1800]);
}

#[test]
fn exon_token_fields() {
    let token = ExonToken::parse("101_110_+").expect("token");
    assert_eq!((token.start, token.end, token.strand, token.raw), (101, 110, "+", "101_110_+"));
    assert_eq!(token.zero_based(), Some(100..110));
}

#[test]
fn exon_token_conversion_edges() {
    assert_eq!(ExonToken::parse("1_1_+").unwrap().zero_based(), Some(0..1));
    assert_eq!(ExonToken::parse("0_5_+").unwrap().zero_based(), None);
    assert_eq!(ExonToken::parse("20_10_+").unwrap().zero_based(), None);
}

#[test]
fn exon_token_grammar_rejects_bad_shapes() {
    for raw in ["", "101", "101_110", "101_110_+_", "a_110_+", "101_b_+", "-1_10_+", "1.5_10_+"] {
        assert_eq!(
            ExonToken::parse(raw),
            Err(Rejection::MalformedExonToken { token: raw.to_string() }),
            "token {raw:?}"
        );
    }
}

#[test]
fn line_classification() {
    assert_eq!(classify_line(""), Line::Blank);
    assert_eq!(classify_line(" \t\r"), Line::Blank);
    assert_eq!(classify_line("Gene\tStatus\tSequence\tGene Start"), Line::Header);
    assert_eq!(classify_line("# Busco id\tStatus"), Line::Header);
    assert_eq!(classify_line("g1\tSingle\r\n"), Line::Data("g1\tSingle"));
}

#[test]
fn trailing_tab_keeps_an_empty_last_field() {
    let line = format!("{}\t\r\n", vec!["x"; MIN_FIELDS - 1].join("\t"));
    let Line::Data(data) = classify_line(&line) else {
        panic!("expected a data line");
    };
    assert!(data.ends_with('\t'));
    let row = GeneRow::parse(data).expect("13 fields, the last one empty");
    assert_eq!(row.exons, "");
    assert!(matches!(
        row.exon_tokens(),
        Err(Rejection::MalformedExonToken { .. })
    ));
}
