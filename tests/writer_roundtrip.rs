use tabular_ingest::ingestion::csv::ingest_csv_from_str;
use tabular_ingest::ingestion::IngestionOptions;
use tabular_ingest::record::DynamicRecord;
use tabular_ingest::tokenizer::Tokenizer;
use tabular_ingest::writer::{encode_line, write_records};

#[test]
fn encoded_lines_tokenize_back_to_the_same_fields() {
    let tokenizer = Tokenizer::default();
    for fields in [
        vec!["10", "AU", "Australia"],
        vec!["12", "US", "United States, The"],
        vec!["say \"hi\"", "", "tail"],
    ] {
        let line = encode_line(&fields, ',', '"').unwrap();
        assert_eq!(tokenizer.tokenize(&line), fields, "line: {line}");
    }
}

#[test]
fn written_records_read_back() {
    let text = "no,code,country\n10,AU,Australia\n12,US,\"United States, The\"\n";
    let records = ingest_csv_from_str::<DynamicRecord>("countries.csv", text, &IngestionOptions::default())
        .unwrap()
        .records;

    let mut out = Vec::new();
    write_records(&mut out, &records, ';', '"').unwrap();
    let written = String::from_utf8(out).unwrap();

    let options = IngestionOptions::builder().separator(';').build();
    let again = ingest_csv_from_str::<DynamicRecord>("copy.csv", &written, &options)
        .unwrap()
        .records;
    assert_eq!(again, records);
}
