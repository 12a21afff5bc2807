//! Integration tests for predx: raw files through conversion to interchange
//! formats and back.

use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

use predx::codec::{self, csv, json};
use predx::flusight::{self, read_flusight_file, write_flusight_file};
use predx::{
    ConversionConfig, Converter, ExportOptions, ExportSummary, Parser, Predx, PredxClass,
    PredxError, PredxTable, RecordError, ValidationError, verify_expected,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn submission_csv() -> &'static str {
    "target,location,predx_class,point,prob,cat,lwr,sample\n\
     peak,US,Point,4.5,NA,NA,NA,NA\n\
     onset,US,Binary,NA,0.25,NA,NA,NA\n\
     onset week,US,BinCat,NA,0.6,42,NA,NA\n\
     onset week,US,BinCat,NA,0.4,none,NA,NA\n\
     wk,US,BinLwr,NA,0.5,NA,1.0,NA\n\
     wk,US,BinLwr,NA,0.5,NA,0.0,NA\n\
     draws,US,Sample,NA,NA,NA,NA,1.5\n\
     draws,US,Sample,NA,NA,NA,NA,2.5\n\
     peak,HHS Region 1,Point,NA,NA,NA,NA,NA\n"
}

// =============================================================================
// Conversion Tests
// =============================================================================

#[test]
fn test_convert_file_with_mixed_classes() {
    let file = create_test_file(submission_csv());
    let data = Parser::new().parse_file(file.path()).expect("Parse failed");
    let table = Converter::new().convert(&data).expect("Conversion failed");

    assert_eq!(table.len(), 6);
    assert_eq!(table.valid_count(), 5);

    let classes: Vec<&str> = table.iter().map(|r| r.predx_class.as_str()).collect();
    assert_eq!(
        classes,
        vec!["Point", "Binary", "BinCat", "BinLwr", "Sample", "Point"]
    );

    let (failed, error) = table.errors().next().expect("one failed record");
    assert_eq!(failed.key_value("location"), Some("HHS Region 1"));
    assert_eq!(error, &RecordError::Validation(ValidationError::Missing));
}

#[test]
fn test_tab_delimited_input() {
    let file = create_test_file(
        "target\tlocation\tpredx_class\tprob\n\
         habitability\tEarth\tBinary\t0.99\n",
    );
    let data = Parser::new().parse_file(file.path()).expect("Parse failed");
    let table = Converter::new().convert(&data).expect("Conversion failed");

    match table.records()[0].predx() {
        Some(Predx::Binary(value)) => assert_eq!(value.prob(), 0.99),
        other => panic!("expected Binary, got {:?}", other),
    }
}

#[test]
fn test_default_class_without_class_column() {
    let file = create_test_file("target,location,sample\npeak,US,1\npeak,US,2\npeak,US,3\n");
    let data = Parser::new().parse_file(file.path()).expect("Parse failed");
    let config = ConversionConfig::default().with_default_class(PredxClass::Sample);
    let table = Converter::with_config(config)
        .convert(&data)
        .expect("Conversion failed");

    assert_eq!(table.len(), 1);
    match table.records()[0].predx() {
        Some(Predx::Sample(sample)) => assert_eq!(sample.len(), 3),
        other => panic!("expected Sample, got {:?}", other),
    }
}

// =============================================================================
// Interchange Round Trips
// =============================================================================

#[test]
fn test_csv_to_json_to_csv() {
    let file = create_test_file(submission_csv());
    let data = Parser::new().parse_file(file.path()).unwrap();
    let table = Converter::new().convert(&data).unwrap();
    let valid = table.filter(|r| r.is_valid());

    let (text, summary) = json::to_json_string(&table).unwrap();
    assert_eq!(summary, ExportSummary { written: 5, skipped: 1 });

    let from_json = json::read_json(text.as_bytes()).unwrap();
    assert_eq!(from_json, valid);

    let (text, _) = csv::to_csv_string(&from_json).unwrap();
    let from_csv = csv::read_csv(text.as_bytes()).unwrap();
    assert_eq!(from_csv, valid);
}

#[test]
fn test_file_export_refuses_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let table = Converter::new()
        .convert(&Parser::new().parse_str(submission_csv()).unwrap())
        .unwrap();

    codec::write_csv_file(&table, &path, ExportOptions::default()).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    let err = codec::write_csv_file(&table, &path, ExportOptions::default()).unwrap_err();
    assert!(matches!(err, PredxError::FileExists(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), first);

    codec::write_csv_file(&table, &path, ExportOptions::overwrite()).unwrap();
    assert_eq!(codec::read_csv_file(&path).unwrap(), table.filter(|r| r.is_valid()));
}

#[test]
fn test_json_document_must_be_array() {
    let file = create_test_file(r#"{"records": []}"#);
    let err = codec::read_json_file(file.path()).unwrap_err();
    assert!(matches!(err, PredxError::Json(_)));
}

#[test]
fn test_empty_file_is_fatal() {
    let file = create_test_file("");
    let err = Parser::new().parse_file(file.path()).unwrap_err();
    assert!(matches!(err, PredxError::EmptyData(_)));
}

// =============================================================================
// FluSight Dialect
// =============================================================================

fn flusight_csv() -> String {
    let mut text = String::from("location,target,type,unit,bin_start_incl,bin_end_notincl,value\n");
    text.push_str("US National,Season onset,Point,week,NA,NA,48\n");
    text.push_str("US National,Season onset,Bin,week,48,49,0.5\n");
    text.push_str("US National,Season onset,Bin,week,none,none,0.5\n");
    text.push_str("US National,1 wk ahead,Point,percent,NA,NA,2.1\n");
    text.push_str("US National,1 wk ahead,Bin,percent,2.0,2.1,0.3\n");
    text.push_str("US National,1 wk ahead,Bin,percent,2.1,2.2,0.75\n");
    text
}

#[test]
fn test_flusight_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("submission.csv");
    fs::write(&input, flusight_csv()).unwrap();

    let table = read_flusight_file(&input).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.valid_count(), 4);

    // 0.3 + 0.75 is rescaled on import
    match table.records()[3].predx() {
        Some(Predx::BinLwr(value)) => {
            let sum: f64 = value.bins().iter().map(|(_, p)| p).sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        other => panic!("expected BinLwr, got {:?}", other),
    }

    let output = dir.path().join("export.csv");
    let summary = write_flusight_file(&table, &output, ExportOptions::default()).unwrap();
    assert_eq!(summary, ExportSummary { written: 4, skipped: 0 });

    let reread = read_flusight_file(&output).unwrap();
    assert_eq!(reread, table);
}

#[test]
fn test_flusight_partial_submission_reports_missing() {
    let table = flusight::import_flusight(&Parser::new().parse_str(&flusight_csv()).unwrap()).unwrap();
    let report = verify_expected(&table, &flusight::flusight_expected());

    assert!(!report.is_complete());
    assert!(report.unexpected.is_empty());
    // Point for US National / Season onset is present
    assert!(!report.missing.iter().any(|key| {
        key.get("location") == Some("US National")
            && key.get("target") == Some("Season onset")
            && key.get("predx_class") == Some("Point")
    }));
    // The 40 bin for onset was never submitted
    assert!(report.missing.iter().any(|key| {
        key.get("location") == Some("US National")
            && key.get("target") == Some("Season onset")
            && key.get("cat") == Some("40")
    }));
}

#[test]
fn test_flusight_export_skips_unsupported_shapes() {
    let table: PredxTable = Converter::new()
        .convert(&Parser::new().parse_str(submission_csv()).unwrap())
        .unwrap();
    let (data, summary) = flusight::export_flusight(&table);

    // Binary, Sample and the failed record have no FluSight form
    assert_eq!(summary, ExportSummary { written: 3, skipped: 3 });
    assert!(data.rows.iter().all(|row| row[2] == "Point" || row[2] == "Bin"));
}
