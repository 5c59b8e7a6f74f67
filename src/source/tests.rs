use std::io::Cursor;

use super::*;
use crate::ingest::RawMobilityScan;

const TWO_SCANS: &str = r#"{"id":"a","frame_index":1,"ms_level":1,"mobility":1.2,"mz_array":[100.0],"intensity_array":[5.0]}

{"id":"b","frame_index":1,"ms_level":1,"mobility":1.1}
"#;

#[test]
fn test_jsonl_reads_and_skips_blank_lines() {
    let mut source = JsonLinesScanSource::new("two.jsonl", Cursor::new(TWO_SCANS));

    let first = source.next_scan().unwrap().unwrap();
    assert_eq!(first.id, "a");
    assert_eq!(first.mz_array, vec![100.0]);

    let second = source.next_scan().unwrap().unwrap();
    assert_eq!(second.id, "b");
    assert_eq!(second.mobility, Some(1.1));

    assert!(source.next_scan().unwrap().is_none());
}

#[test]
fn test_jsonl_rewind_replays_stream() {
    let mut source = JsonLinesScanSource::new("two.jsonl", Cursor::new(TWO_SCANS));
    while source.next_scan().unwrap().is_some() {}

    source.rewind().unwrap();
    assert_eq!(source.next_scan().unwrap().unwrap().id, "a");
}

#[test]
fn test_jsonl_reports_line_of_malformed_record() {
    let data = "{\"id\":\"ok\",\"ms_level\":1}\n{not json}\n";
    let mut source = JsonLinesScanSource::new("bad.jsonl", Cursor::new(data));

    assert!(source.next_scan().unwrap().is_some());
    match source.next_scan() {
        Err(SourceError::ParseError { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_write_json_lines_is_readable() {
    let scans = vec![
        RawMobilityScan {
            id: "x".to_string(),
            ms_level: 2,
            mobility: Some(0.8),
            ..Default::default()
        },
        RawMobilityScan {
            id: "y".to_string(),
            ms_level: 2,
            ..Default::default()
        },
    ];

    let mut buffer = Vec::new();
    assert_eq!(write_json_lines(&mut buffer, scans.clone()).unwrap(), 2);

    let mut source = JsonLinesScanSource::new("mem", Cursor::new(buffer));
    assert_eq!(source.next_scan().unwrap().unwrap(), scans[0]);
    assert_eq!(source.next_scan().unwrap().unwrap(), scans[1]);
}

#[test]
fn test_memory_source_rewinds() {
    let mut source = MemoryScanSource::new(
        "memory",
        vec![RawMobilityScan {
            id: "only".to_string(),
            ..Default::default()
        }],
    );
    assert_eq!(source.len_hint(), Some(1));
    assert!(source.next_scan().unwrap().is_some());
    assert!(source.next_scan().unwrap().is_none());
    source.rewind().unwrap();
    assert!(source.next_scan().unwrap().is_some());
}
