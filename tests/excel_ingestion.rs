#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_ingest::ingestion::excel::{ingest_excel_from_path, ingest_excel_from_path_with_report, load_sheets};
use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions, SheetSelection};
use tabular_ingest::record::{Accessors, DynamicRecord, TypedRecord};
use tabular_ingest::sheet::Sheet;
use tabular_ingest::tolerance::DiagnosticKind;
use tabular_ingest::types::Value;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-ingest-{name}-{nanos}.xlsx"))
}

#[derive(Debug, Default, PartialEq)]
struct Country {
    no: i64,
    name: String,
}

impl TypedRecord for Country {
    fn accessors() -> Accessors<Self> {
        Accessors::<Self>::new()
            .field("no", |c, v| {
                c.no = v.to_i64()?;
                Ok(())
            })
            .field("name", |c, v| {
                c.name = v.into_text();
                Ok(())
            })
    }
}

/// Sheets: `Countries` (title row, header on row 3), `Notes` (free text), `Islands` (header on row 1,
/// `END` marker before a trailing row).
fn write_countries_xlsx(path: &PathBuf) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();

    let ws = wb.add_worksheet();
    ws.set_name("Countries").unwrap();
    ws.write_string(0, 0, "Country list").unwrap();
    ws.write_string(2, 0, "no").unwrap();
    ws.write_string(2, 1, "code").unwrap();
    ws.write_string(2, 2, "country").unwrap();
    ws.write_number(3, 0, 10).unwrap();
    ws.write_string(3, 1, "AU").unwrap();
    ws.write_string(3, 2, "Australia").unwrap();
    ws.write_number(4, 0, 11).unwrap();
    ws.write_string(4, 1, "NZ").unwrap();
    ws.write_string(4, 2, "New Zealand").unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Notes").unwrap();
    ws.write_string(0, 0, "figures are provisional").unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Islands").unwrap();
    ws.write_string(0, 0, "no").unwrap();
    ws.write_string(0, 1, "country").unwrap();
    ws.write_string(0, 2, "tropical").unwrap();
    ws.write_number(1, 0, 20).unwrap();
    ws.write_string(1, 1, "Fiji").unwrap();
    ws.write_boolean(1, 2, true).unwrap();
    ws.write_number(2, 0, 21.5).unwrap();
    ws.write_string(2, 1, "Samoa").unwrap();
    ws.write_boolean(2, 2, true).unwrap();
    ws.write_string(3, 0, "END").unwrap();
    ws.write_number(4, 0, 22).unwrap();
    ws.write_string(4, 1, "Tonga").unwrap();

    wb.save(path).unwrap();
}

#[test]
fn typed_records_across_selected_sheets() {
    let path = tmp_file("countries");
    write_countries_xlsx(&path);

    let options = IngestionOptions::builder()
        .map("country").to("name")
        .sheets(["Countries"])
        .build();
    let countries: Vec<Country> = ingest_excel_from_path(&path, &options).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(
        countries,
        vec![
            Country {
                no: 10,
                name: "Australia".to_string(),
            },
            Country {
                no: 11,
                name: "New Zealand".to_string(),
            },
        ]
    );
}

#[test]
fn sheet_without_captions_is_skipped_and_reported() {
    let path = tmp_file("countries-notes");
    write_countries_xlsx(&path);

    let options = IngestionOptions::builder()
        .map("country").to("name")
        .exclude_sheets(["Islands"])
        .build();
    let out = ingest_excel_from_path_with_report::<Country>(&path, &options).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.report.tables.len(), 2);
    assert_eq!(out.report.tables[0].header_row, Some(3));
    assert_eq!(out.report.tables[1].sheet, "Notes");
    assert_eq!(out.report.tables[1].header_row, None);
    assert!(
        out.report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::HeaderLocation && d.sheet.as_deref() == Some("Notes"))
    );
}

#[test]
fn dynamic_records_keep_cell_types_and_stop_at_terminator() {
    let path = tmp_file("islands");
    write_countries_xlsx(&path);

    let options = IngestionOptions::builder()
        .sheet_positions([2])
        .terminator("END")
        .build();
    let out = ingest_excel_from_path_with_report::<DynamicRecord>(&path, &options).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].get("no"), Some(&Value::Int64(20)));
    assert_eq!(out.records[0].get("tropical"), Some(&Value::Bool(true)));
    assert_eq!(out.records[1].get("no"), Some(&Value::Float64(21.5)));
    assert!(out.report.tables[0].terminated);
}

#[test]
fn terminator_only_stops_its_own_sheet() {
    let path = tmp_file("islands-then-countries");
    write_countries_xlsx(&path);

    let options = IngestionOptions::builder()
        .map("country").to("name")
        .exclude_sheet_positions([1])
        .terminator("END")
        .build();
    let countries: Vec<Country> = ingest_from_path(&path, &options).unwrap();
    let _ = std::fs::remove_file(&path);

    let names: Vec<&str> = countries.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Australia", "New Zealand", "Fiji", "Samoa"]);
}

#[test]
fn load_sheets_keeps_workbook_order() {
    let path = tmp_file("selection");
    write_countries_xlsx(&path);

    let sheets = load_sheets(&path, &SheetSelection::by_name(["islands", "COUNTRIES"])).unwrap();
    let _ = std::fs::remove_file(&path);

    let names: Vec<&str> = sheets.iter().map(Sheet::name).collect();
    assert_eq!(names, vec!["Countries", "Islands"]);
}
