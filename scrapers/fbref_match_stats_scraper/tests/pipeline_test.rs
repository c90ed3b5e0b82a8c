use anyhow::Result;
use pretty_assertions::assert_eq;

use fbref_match_stats_scraper::{
    config::{OutputLayout, PipelineConfig},
    pipeline::MatchPipeline,
    selector::SelectionPolicy,
    sink::{output_path, read_table, write_table},
    types::{ColumnSignature, MatchId},
};

const MATCH_URL: &str = "https://fbref.com/en/matches/07f058d4/Dinamo-Zagreb-Chelsea-September-6-2022-Champions-League";
const MATCH_HTML: &str = include_str!("fixtures/match_report.html");
const EXPECTED_CSV: &str = include_str!("fixtures/match_report_player_stats.csv");

fn read_expected(csv_text: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn pipeline(selection: SelectionPolicy, layout: OutputLayout) -> MatchPipeline {
    MatchPipeline::new(&PipelineConfig {
        selection,
        layout,
        ..PipelineConfig::default()
    })
}

#[test_log::test]
fn test_player_stats_match_report() -> Result<()> {
    let doc = MatchPipeline::new(&PipelineConfig::default()).parse_html(MATCH_HTML, MATCH_URL)?;

    assert_eq!(doc.match_id, MatchId::Known("07f058d4".to_string()));
    assert_eq!(doc.table_count, 2);
    assert_eq!(doc.tables.len(), 1);

    let (expected_columns, expected_rows) = read_expected(EXPECTED_CSV)?;
    assert_eq!(doc.tables[0].columns, expected_columns);
    assert_eq!(doc.tables[0].rows, expected_rows);
    Ok(())
}

#[test_log::test]
fn test_combined_csv_written_to_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = MatchPipeline::new(&PipelineConfig::default()).parse_html(MATCH_HTML, MATCH_URL)?;

    let path = output_path(dir.path(), OutputLayout::Combined, &doc.output_key, &doc.tables[0]);
    assert_eq!(path, dir.path().join("match_07f058d4_player_stats.csv"));
    write_table(&path, &doc.tables[0])?;

    let (columns, rows) = read_table(&path)?;
    let (expected_columns, expected_rows) = read_expected(EXPECTED_CSV)?;
    assert_eq!(columns, expected_columns);
    assert_eq!(rows, expected_rows);
    Ok(())
}

#[test_log::test]
fn test_accept_all_writes_every_table() -> Result<()> {
    let doc = pipeline(SelectionPolicy::AcceptAll, OutputLayout::PerTable).parse_html(MATCH_HTML, MATCH_URL)?;

    let names: Vec<&str> = doc.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "stats_7b00f85d_summary",
            "stats_7b00f85d_passing",
            "stats_cff3d9bb_summary",
            "keeper_stats_cff3d9bb",
        ]
    );

    let passing = &doc.tables[1];
    assert_eq!(passing.columns, vec!["match_id", "Player", "Nation", "Pos", "Min", "Cmp", "Att"]);
    assert_eq!(passing.rows, vec![vec!["07f058d4", "Mislav Oršić", "CRO", "LW", "90", "21", "30"]]);

    let dir = tempfile::tempdir()?;
    let path = output_path(dir.path(), OutputLayout::PerTable, &doc.output_key, passing);
    assert_eq!(path, dir.path().join("07f058d4").join("stats_7b00f85d_passing.csv"));
    Ok(())
}

#[test_log::test]
fn test_custom_signature_with_unlabelled_caption() -> Result<()> {
    let keepers = pipeline(
        SelectionPolicy::SignatureMatch(ColumnSignature::parse_list("Player,SoTA,Saves")),
        OutputLayout::Combined,
    )
    .parse_html(MATCH_HTML, MATCH_URL)?;

    assert_eq!(keepers.table_count, 1);
    let table = &keepers.tables[0];
    assert_eq!(&table.columns[..3], &["match_id", "team", "Player"]);
    assert_eq!(table.rows, vec![vec!["07f058d4", "Unknown", "Kepa Arrizabalaga", "ESP", "27-349", "90", "2", "1", "1"]]);
    Ok(())
}
