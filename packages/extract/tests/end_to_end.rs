use chrono::NaiveDate;
use met_bulletin_extract::{
    BulletinPipeline, CollectedDiagnostics, DateSource, Diagnostic, ProfileConfig, StrategyKind,
    StrategyMode, ValueNormalizer,
};
use met_bulletin_observation_models::{CellValue, Metric, Observation};
use met_bulletin_pdf::{Document, TableGrid};
use pretty_assertions::assert_eq;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn weather() -> BulletinPipeline {
    BulletinPipeline::from_profile(&ProfileConfig::builtin("weather").unwrap()).unwrap()
}

const HEADER: &str = "DEPARTMENT OF METEOROLOGY\n\
                      Weather data for the 24 hour period ending at 0830 on 2025.06.20\n\
                      Station          Max    Min   Rainfall\n";

#[test]
fn anchored_line_produces_dated_observations() {
    let text = format!("{HEADER}Colombo 32.1 24.5 TR\n");
    let doc = Document::from_text("weather-2025-06-20.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert_eq!(result.date.date, ymd(2025, 6, 19));
    assert_eq!(result.date.source, DateSource::Anchored);
    assert_eq!(result.strategies, vec![StrategyKind::AnchoredLine]);
    assert_eq!(
        result.observations,
        vec![
            Observation {
                date: ymd(2025, 6, 19),
                station: "Colombo".to_owned(),
                metric: Metric::Max,
                value: CellValue::Number(32.1),
            },
            Observation {
                date: ymd(2025, 6, 19),
                station: "Colombo".to_owned(),
                metric: Metric::Min,
                value: CellValue::Number(24.5),
            },
            Observation {
                date: ymd(2025, 6, 19),
                station: "Colombo".to_owned(),
                metric: Metric::Rainfall,
                value: CellValue::Number(0.01),
            },
        ]
    );
    assert!(sink.is_empty());
}

#[test]
fn unknown_station_yields_no_observations_and_one_diagnostic() {
    let text = format!("{HEADER}Xyzplace 10.0 5.0 0.0\n");
    let doc = Document::from_text("weather-2025-06-20.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert!(result.observations.is_empty());
    assert_eq!(sink.len(), 1);
    match &sink.entries()[0] {
        Diagnostic::UnmatchedStation {
            station_text,
            value_texts,
            source_line,
            ..
        } => {
            assert_eq!(station_text, "Xyzplace");
            assert_eq!(value_texts, &["10.0", "5.0", "0.0"]);
            assert_eq!(source_line, "Xyzplace 10.0 5.0 0.0");
        }
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

#[test]
fn noisy_bulletin_recovers_what_it_can() {
    let text = format!(
        "{HEADER}\
         Anuradhapura 34.2 25.0 --\n\
         Nuwara Eliya 20.4\n\
         NA 3.2\n\
         Hambantota 31.0 26.2 12.5\n\
         Colombo 32.1 24.5 TR\n\
         Colombo 99.9 20.0 4.0\n"
    );
    let doc = Document::from_text("weather.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);
    let value = |station: &str, metric: Metric| {
        result
            .observations
            .iter()
            .find(|o| o.station == station && o.metric == metric)
            .map(|o| o.value)
    };

    // Dash rainfall means no rain, and aliases resolve.
    assert_eq!(value("Anuradhapura", Metric::Rainfall), Some(CellValue::Number(0.0)));
    assert_eq!(value("Hambanthota", Metric::Rainfall), Some(CellValue::Number(12.5)));

    // The first Colombo line wins.
    assert_eq!(value("Colombo", Metric::Max), Some(CellValue::Number(32.1)));
    assert_eq!(value("Colombo", Metric::Rainfall), Some(CellValue::Number(0.01)));

    // Anchored-line matching found complete lines, so the wrapped record is
    // not attempted in first-non-empty mode. Union mode recovers it.
    assert_eq!(value("Nuwara Eliya", Metric::Max), None);

    // The implausible repeat is rejected before the duplicate check.
    assert!(sink.entries().iter().any(|d| matches!(
        d,
        Diagnostic::RejectedValue { station, metric: Metric::Max, raw, .. }
            if station == "Colombo" && raw == "99.9"
    )));
}

#[test]
fn ocr_damage_falls_through_to_brute_force() {
    let text = format!("{HEADER}Rathnapura 3O.5 23.1 T R\n");
    let doc = Document::from_text("weather.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert_eq!(result.strategies, vec![StrategyKind::BruteForce]);
    let got: Vec<(&str, Metric, CellValue)> = result
        .observations
        .iter()
        .map(|o| (o.station.as_str(), o.metric, o.value))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Rathnapura", Metric::Max, CellValue::Number(30.5)),
            ("Rathnapura", Metric::Min, CellValue::Number(23.1)),
            ("Rathnapura", Metric::Rainfall, CellValue::Number(0.01)),
        ]
    );
}

#[test]
fn wrapped_records_are_recovered_when_no_line_is_complete() {
    let text = format!("{HEADER}Nuwara Eliya 20.4\nNA 3.2\n");
    let doc = Document::from_text("weather.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert_eq!(result.strategies, vec![StrategyKind::WrappedLine]);
    let values: Vec<CellValue> = result.observations.iter().map(|o| o.value).collect();
    assert_eq!(
        values,
        vec![
            CellValue::Number(20.4),
            CellValue::NotAvailable,
            CellValue::Number(3.2)
        ]
    );
}

#[test]
fn punctuated_codes_stay_on_the_anchored_line() {
    let text = format!("{HEADER}Colombo 32.1 24.5 TR.\nGalle 31.0 N/A 2.0\n");
    let doc = Document::from_text("weather.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert_eq!(result.strategies, vec![StrategyKind::AnchoredLine]);
    let got: Vec<(&str, Metric, CellValue)> = result
        .observations
        .iter()
        .map(|o| (o.station.as_str(), o.metric, o.value))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Colombo", Metric::Max, CellValue::Number(32.1)),
            ("Colombo", Metric::Min, CellValue::Number(24.5)),
            ("Colombo", Metric::Rainfall, CellValue::Number(0.01)),
            ("Galle", Metric::Max, CellValue::Number(31.0)),
            ("Galle", Metric::Min, CellValue::NotAvailable),
            ("Galle", Metric::Rainfall, CellValue::Number(2.0)),
        ]
    );
    assert!(sink.is_empty());
}

#[test]
fn damaged_table_cell_is_reported_and_the_row_kept() {
    let table = TableGrid::new(
        [
            ["Station", "Max", "Min", "Rainfall"],
            ["Jaffna", "33.0", "x?", "Tr."],
            ["Galle", "31.0", "n/a", "2.0"],
        ]
        .iter()
        .map(|row| row.iter().map(|c| (*c).to_owned()).collect())
        .collect(),
    );
    let doc =
        Document::from_text("weather.pdf", HEADER, ymd(2025, 6, 20)).with_tables(vec![table]);
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert_eq!(result.strategies, vec![StrategyKind::StructuredTable]);
    let got: Vec<(&str, Metric, CellValue)> = result
        .observations
        .iter()
        .map(|o| (o.station.as_str(), o.metric, o.value))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Jaffna", Metric::Max, CellValue::Number(33.0)),
            ("Jaffna", Metric::Rainfall, CellValue::Number(0.01)),
            ("Galle", Metric::Max, CellValue::Number(31.0)),
            ("Galle", Metric::Min, CellValue::NotAvailable),
            ("Galle", Metric::Rainfall, CellValue::Number(2.0)),
        ]
    );
    assert_eq!(sink.len(), 1);
    assert!(matches!(
        &sink.entries()[0],
        Diagnostic::RejectedValue { station, metric: Metric::Min, raw, .. }
            if station == "Jaffna" && raw == "x?"
    ));
}

#[test]
fn union_mode_recovers_wrapped_record_beside_complete_lines() {
    let mut profile = ProfileConfig::builtin("weather").unwrap();
    profile.extraction.mode = StrategyMode::Union;
    let pipeline = BulletinPipeline::from_profile(&profile).unwrap();

    let text = format!("{HEADER}Colombo 32.1 24.5 TR\nNuwara Eliya 20.4\nNA 3.2\n");
    let doc = Document::from_text("weather.pdf", &text, ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = pipeline.extract(&doc, &mut sink);

    assert!(result.strategies.contains(&StrategyKind::WrappedLine));
    let value = |station: &str, metric: Metric| {
        result
            .observations
            .iter()
            .find(|o| o.station == station && o.metric == metric)
            .map(|o| o.value)
    };
    assert_eq!(value("Colombo", Metric::Max), Some(CellValue::Number(32.1)));
    assert_eq!(value("Nuwara Eliya", Metric::Max), Some(CellValue::Number(20.4)));
    assert_eq!(value("Nuwara Eliya", Metric::Min), Some(CellValue::NotAvailable));
    assert_eq!(value("Nuwara Eliya", Metric::Rainfall), Some(CellValue::Number(3.2)));
}

#[test]
fn date_falls_back_to_document_date() {
    let doc = Document::from_text("weather.pdf", "Colombo 32.1 24.5 TR", ymd(2025, 6, 20));
    let mut sink = CollectedDiagnostics::new();

    let result = weather().extract(&doc, &mut sink);

    assert_eq!(result.date.source, DateSource::Fallback);
    assert!(result.observations.iter().all(|o| o.date == ymd(2025, 6, 20)));
}

#[test]
fn normalizer_sentinels() {
    let n = ValueNormalizer::default();
    assert_eq!(n.normalize("TR"), CellValue::Number(0.01));
    assert_eq!(n.normalize("T.R"), n.normalize("TR"));
    assert_eq!(n.normalize("T R"), n.normalize("TR"));
    assert_eq!(n.normalize("NA"), CellValue::NotAvailable);
    assert_eq!(n.normalize("-"), CellValue::Missing);
    assert_eq!(n.normalize("3O.5"), CellValue::Number(30.5));
}
