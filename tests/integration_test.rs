//! Integration tests for imsframe
//!
//! These tests run the full pipeline from a JSON Lines dump on disk to an
//! imported file, using the temp-file backed payload store.

use imsframe::prelude::*;
use imsframe::source::{write_json_lines, SourceError};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tempfile::tempdir;

const BUCKETS: usize = 20;

fn mobility(bucket: usize) -> f64 {
    1.30 - bucket as f64 * 0.025
}

/// A TIMS run where every third frame is PASEF MS2 and some scans are omitted.
fn tims_run(frames: u32) -> Vec<RawMobilityScan> {
    let mut scans = Vec::new();
    for frame in 1..=frames {
        let ms_level = if frame % 3 == 0 { 2 } else { 1 };
        for bucket in 0..BUCKETS {
            // frame 1 is complete so the axis sees every bucket
            if frame > 1 && (bucket + frame as usize) % 4 == 0 {
                continue;
            }
            let precursors = if ms_level == 2 && (5..12).contains(&bucket) {
                vec![PrecursorEntry {
                    isolation_mz: Some(612.8),
                    isolation_lower_offset: Some(1.0),
                    isolation_upper_offset: Some(1.0),
                    collision_energy: Some(31.5),
                    charge: Some(2),
                    ..Default::default()
                }]
            } else {
                Vec::new()
            };
            scans.push(RawMobilityScan {
                id: format!("frame={frame} scan={}", bucket + 1),
                frame_index: frame,
                scan_number: bucket as u32 + 1,
                ms_level,
                retention_time: frame as f32 * 0.1,
                polarity: 1,
                mobility: Some(mobility(bucket)),
                mz_array: vec![200.0, 400.0 + bucket as f64, 600.0],
                intensity_array: vec![5.0, 50.0 + frame as f64, 1.0],
                precursors,
            });
        }
    }
    scans
}

fn write_run(path: &Path, scans: Vec<RawMobilityScan>) {
    let writer = BufWriter::new(File::create(path).unwrap());
    write_json_lines(writer, scans).unwrap();
}

fn import_file(path: &Path, config: ImportConfig) -> ImportOutcome<SpillFileStorage> {
    let source = JsonLinesScanSource::open(path).unwrap();
    RawFileBuilder::with_config(SpillFileStorage::new().unwrap(), config)
        .build(source, MobilityType::Tims)
        .unwrap()
}

/// Test the complete dump-import cycle
#[test]
fn test_jsonl_import_cycle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    write_run(&path, tims_run(12));

    let file = import_file(&path, ImportConfig::default())
        .completed()
        .expect("import should complete");

    assert_eq!(file.name(), "run.jsonl");
    assert_eq!(file.frames().len(), 12);

    let axis = file.mobility_axis().unwrap();
    assert_eq!(axis.len(), BUCKETS);
    assert!(axis.is_reversed());

    for frame in file.frames() {
        // shape is identical for every frame
        assert_eq!(frame.bucket_count(), BUCKETS);
        assert_eq!(frame.storage_offsets().len(), BUCKETS);
        assert_eq!(frame.base_peak_indices().len(), BUCKETS);
        assert_eq!(frame.mobilities(), axis.centers().as_slice());

        for bucket in 0..BUCKETS {
            let omitted = frame.frame_number() > 1
                && (bucket + frame.frame_number() as usize) % 4 == 0;
            assert_eq!(frame.is_populated(bucket), !omitted);

            if omitted {
                assert_eq!(frame.base_peak_indices()[bucket], -1);
                let fill_from = bucket.checked_sub(1).unwrap_or(1);
                assert_eq!(
                    frame.storage_offsets()[bucket],
                    frame.storage_offsets()[fill_from]
                );
            } else {
                assert_eq!(frame.base_peak_indices()[bucket], 1);
                let payload = frame.mobility_scan(bucket, file.storage()).unwrap().unwrap();
                assert_eq!(payload.mz[1], 400.0 + bucket as f64);
            }
        }
    }

    let ms2 = file.frame(3).unwrap();
    assert_eq!(ms2.header().ms_level, 2);
    let windows = ms2.precursor_windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].first_scan_index(), 5);
    assert_eq!(windows[0].last_scan_index(), 11);
    assert_eq!(windows[0].charge(), 2);
    assert!(file.frame(2).unwrap().precursor_windows().is_empty());
}

#[test]
fn test_summary_serializes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    write_run(&path, tims_run(4));

    let file = import_file(&path, ImportConfig::default()).completed().unwrap();
    let json = serde_json::to_value(file.summary()).unwrap();

    assert_eq!(json["name"], "run.jsonl");
    assert_eq!(json["mobility_type"], "tims");
    assert_eq!(json["frame_count"], 4);
    assert_eq!(json["bucket_count"], BUCKETS);
    assert_eq!(json["axis_reversed"], true);
    assert_eq!(json["frames"].as_array().unwrap().len(), 4);
    assert_eq!(json["frames"][2]["precursor_windows"][0]["first_scan_index"], 5);
    assert!(json["imported_at"].is_string());

    let summary_path = dir.path().join("run.summary.json");
    fs::write(&summary_path, serde_json::to_vec_pretty(&json).unwrap()).unwrap();
    assert!(fs::metadata(&summary_path).unwrap().len() > 0);
}

#[test]
fn test_malformed_line_aborts_import() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.jsonl");
    let mut content = String::new();
    for scan in tims_run(1).into_iter().take(3) {
        content.push_str(&serde_json::to_string(&scan).unwrap());
        content.push('\n');
    }
    content.push_str("{\"frame_index\": 1, \"mobility\": \n");
    fs::write(&path, content).unwrap();

    let err = RawFileBuilder::new(MemoryStorage::new())
        .build(JsonLinesScanSource::open(&path).unwrap(), MobilityType::Tims)
        .err()
        .expect("import should fail");

    match err {
        ImportError::Read {
            file,
            source: SourceError::ParseError { line, .. },
        } => {
            assert_eq!(file, "broken.jsonl");
            assert_eq!(line, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_filters_removing_everything_yield_empty_result() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    write_run(&path, tims_run(3));

    let config = ImportConfig {
        scan_filter: ScanFilter {
            retention_time: Some([100.0, 200.0]),
            ..Default::default()
        },
        ..Default::default()
    };
    match import_file(&path, config) {
        ImportOutcome::Empty(empty) => {
            assert!(empty.filters_active);
            assert!(empty.to_string().starts_with("run.jsonl had 0 scans after import."));
        }
        _ => panic!("expected an empty result"),
    }
}

/// Cancels the shared task once a given number of scans has been read.
struct CancellingSource<S> {
    inner: S,
    task: ImportTask,
    remaining: usize,
}

impl<S: ScanSource> ScanSource for CancellingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn next_scan(&mut self) -> Result<Option<RawMobilityScan>, SourceError> {
        if self.remaining == 0 {
            self.task.cancel();
        } else {
            self.remaining -= 1;
        }
        self.inner.next_scan()
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.inner.rewind()
    }
}

#[test]
fn test_cancellation_mid_file() {
    let scans = tims_run(6);
    let total = scans.len();
    let task = ImportTask::new();

    // survives the first pass, cancels during frame assembly
    let source = CancellingSource {
        inner: MemoryScanSource::new("run.jsonl", scans),
        task: task.clone(),
        remaining: total + 30,
    };
    let outcome = RawFileBuilder::new(MemoryStorage::new())
        .with_task(task.clone())
        .build(source, MobilityType::Tims)
        .unwrap();

    assert!(outcome.is_cancelled());
    assert!(task.is_cancelled());
    assert!(task.converted() < 6);
}

#[test]
fn test_progress_is_visible_across_threads() {
    let task = ImportTask::new();
    let worker_task = task.clone();

    let handle = std::thread::spawn(move || {
        RawFileBuilder::new(MemoryStorage::new())
            .with_task(worker_task)
            .build(MemoryScanSource::new("threaded.jsonl", tims_run(5)), MobilityType::Tims)
            .map(|outcome| outcome.completed().map(|file| file.frames().len()))
    });
    let frames = handle.join().unwrap().unwrap();

    assert_eq!(frames, Some(5));
    assert_eq!(task.finished_percentage(), 1.0);
    assert_eq!(
        task.description(),
        "Importing threaded.jsonl, total / parsed is 5 / 5"
    );
}
