use chrono::NaiveDate;

use tabular_ingest::ingestion::csv::{ingest_csv_from_path_with_report, ingest_csv_from_str};
use tabular_ingest::ingestion::{IngestionOptions, IngestionOptionsBuilder};
use tabular_ingest::record::{Accessors, NestedTarget, TypedRecord};
use tabular_ingest::tolerance::{DiagnosticKind, Tolerance};
use tabular_ingest::{AssignError, IngestionError};

#[derive(Debug, Default, PartialEq)]
struct Address {
    street_no: i64,
    street: String,
    suburb: String,
}

impl TypedRecord for Address {
    fn accessors() -> Accessors<Self> {
        Accessors::<Self>::new()
            .field("streetNo", |a, v| {
                a.street_no = v.to_i64()?;
                Ok(())
            })
            .field("street", |a, v| {
                a.street = v.into_text();
                Ok(())
            })
            .field("suburb", |a, v| {
                a.suburb = v.into_text();
                Ok(())
            })
    }
}

#[derive(Debug, Default)]
struct Student {
    first_name: String,
    last_name: String,
    enrolled: Option<NaiveDate>,
    score: f64,
    address: Option<Address>,
}

impl TypedRecord for Student {
    fn accessors() -> Accessors<Self> {
        Accessors::<Self>::new()
            .field("firstName", |s, v| {
                s.first_name = v.into_text();
                Ok(())
            })
            .field("lastName", |s, v| {
                s.last_name = v.into_text();
                Ok(())
            })
            .field("enrolled", |s, v| {
                s.enrolled = Some(v.to_timestamp()?.date());
                Ok(())
            })
            .field("score", |s, v| {
                s.score = v.to_f64()?;
                Ok(())
            })
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut dyn NestedTarget> {
        match key {
            "address" => Some(self.address.get_or_insert_with(Address::default)),
            _ => None,
        }
    }
}

fn student_options() -> IngestionOptionsBuilder {
    IngestionOptions::builder()
        .map("Street #").to("address.streetNo")
        .map("Street").to("address.street")
        .map("Suburb").to("address.suburb")
        .terminator("END")
}

#[test]
fn students_with_nested_addresses() {
    let options = student_options().build();
    let out = ingest_csv_from_path_with_report::<Student>("tests/fixtures/students.csv", &options).unwrap();

    assert_eq!(out.report.tables[0].header_row, Some(4));
    assert!(out.report.tables[0].terminated);
    assert_eq!(out.records.len(), 3);

    let ada = &out.records[0];
    assert_eq!(ada.first_name, "Ada");
    assert_eq!(ada.last_name, "Lovelace");
    assert_eq!(ada.enrolled, NaiveDate::from_ymd_opt(2024, 2, 1));
    assert_eq!(ada.score, 91.5);
    assert_eq!(
        ada.address,
        Some(Address {
            street_no: 12,
            street: "Premier St".to_string(),
            suburb: "Marleston".to_string(),
        })
    );

    assert_eq!(out.records[1].score, 88.0);
    assert!(out.records.iter().all(|s| s.first_name != "Ghost"));
}

#[test]
fn bad_cell_is_skipped_and_reported_when_tolerant() {
    let options = student_options().tolerance(Tolerance::Tolerant).build();
    let out = ingest_csv_from_path_with_report::<Student>("tests/fixtures/students.csv", &options).unwrap();

    let grace = &out.records[2];
    assert_eq!(grace.first_name, "Grace");
    let address = grace.address.as_ref().unwrap();
    assert_eq!(address.street_no, 0);
    assert_eq!(address.street, "Main St");

    assert_eq!(out.report.diagnostics.len(), 1);
    let diagnostic = &out.report.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::PropertyAssignment);
    assert_eq!(diagnostic.row, Some(8));
    assert_eq!(diagnostic.column, Some(3));
}

#[test]
fn bad_cell_fails_strict_run() {
    let options = student_options().header_row(3).strict().build();
    let text = std::fs::read_to_string("tests/fixtures/students.csv").unwrap();
    let err = ingest_csv_from_str::<Student>("students.csv", &text, &options).unwrap_err();

    match err {
        IngestionError::PropertyAssignment {
            row,
            column,
            field,
            value,
            source,
            ..
        } => {
            assert_eq!((row, column), (8, 3));
            assert_eq!(field, "address.streetNo");
            assert_eq!(value, "x1");
            assert!(matches!(source, AssignError::Conversion { .. } | AssignError::TypeMismatch { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unbound_fields_are_reported() {
    let text = "First Name,Last Name\nAda,Lovelace\n";
    let out = ingest_csv_from_str::<Student>("names.csv", text, &IngestionOptions::default()).unwrap();

    assert_eq!(out.records[0].first_name, "Ada");
    assert_eq!(out.report.diagnostics.len(), 1);
    let diagnostic = &out.report.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::HeaderLocation);
    assert!(diagnostic.message.contains("enrolled"));
    assert!(diagnostic.message.contains("score"));
}

#[test]
fn unknown_nested_path_fails_on_assignment() {
    let options = IngestionOptions::builder()
        .map("First Name").to("firstName")
        .map("Phone").to("contact.phone")
        .tolerance(Tolerance::Tolerant)
        .build();
    let text = "First Name,Phone\nAda,555\n";
    let out = ingest_csv_from_str::<Student>("contacts.csv", text, &options).unwrap();

    assert_eq!(out.records[0].first_name, "Ada");
    assert!(
        out.report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::PropertyAssignment && d.message.contains("contact.phone"))
    );
}
