use super::*;
use crate::frame::NO_DATA;
use crate::ingest::PrecursorEntry;
use crate::source::MemoryScanSource;
use crate::storage::{MemoryStorage, SpillFileStorage};

const MOBILITIES: [f64; 6] = [1.40, 1.35, 1.30, 1.25, 1.20, 1.15];

fn scan(frame_index: u32, scan_number: u32, rt: f32, mobility: Option<f64>) -> RawMobilityScan {
    RawMobilityScan {
        id: format!("frame={frame_index} scan={scan_number}"),
        frame_index,
        scan_number,
        ms_level: 1,
        retention_time: rt,
        polarity: 1,
        mobility,
        mz_array: vec![300.0, 400.0, 500.0],
        intensity_array: vec![10.0, 30.0, 20.0],
        precursors: Vec::new(),
    }
}

/// A TIMS frame reporting only the buckets in `present`.
fn frame(frame_index: u32, present: &[usize]) -> Vec<RawMobilityScan> {
    present
        .iter()
        .map(|&i| {
            scan(
                frame_index,
                i as u32 + 1,
                frame_index as f32 * 0.1,
                Some(MOBILITIES[i]),
            )
        })
        .collect()
}

fn run() -> Vec<RawMobilityScan> {
    let mut scans = frame(1, &[0, 1, 2, 3, 4, 5]);
    scans.extend(frame(2, &[1, 4]));

    let mut ms2 = frame(3, &[0, 1, 3, 5]);
    for scan in &mut ms2[1..3] {
        scan.ms_level = 2;
        scan.precursors.push(PrecursorEntry {
            isolation_mz: Some(722.4),
            isolation_lower_offset: Some(1.0),
            isolation_upper_offset: Some(1.0),
            collision_energy: Some(42.0),
            charge: Some(2),
            ..Default::default()
        });
    }
    scans.extend(ms2);
    scans
}

fn import<S: ArrayStorage>(
    builder: RawFileBuilder<S>,
    scans: Vec<RawMobilityScan>,
    instrument: MobilityType,
) -> ImportOutcome<S> {
    builder
        .build(MemoryScanSource::new("run.jsonl", scans), instrument)
        .unwrap()
}

#[test]
fn test_tims_run_is_reconstructed() {
    let builder = RawFileBuilder::new(MemoryStorage::new());
    let task = builder.task().clone();
    let file = import(builder, run(), MobilityType::Tims).completed().unwrap();

    assert!(file.is_ims());
    assert_eq!(file.mobility_type(), MobilityType::Tims);
    let axis = file.mobility_axis().unwrap();
    assert!(axis.is_reversed());
    assert_eq!(axis.len(), 6);
    assert_eq!(axis.buckets()[0].center(), 1.40);

    let frames = file.frames();
    assert_eq!(frames.len(), 3);
    for (expected, frame) in (1..).zip(frames) {
        assert_eq!(frame.frame_number(), expected);
        assert_eq!(frame.bucket_count(), 6);
        assert_eq!(frame.storage_offsets().len(), 6);
        assert_eq!(frame.mobilities().len(), 6);
    }

    assert_eq!(frames[0].base_peak_indices(), &[1, 1, 1, 1, 1, 1]);
    assert_eq!(frames[1].base_peak_indices(), &[-1, 1, -1, -1, 1, -1]);
    assert_eq!(frames[1].real_scan_count(), 2);

    let ms2 = file.frame(3).unwrap();
    assert_eq!(ms2.header().ms_level, 1);
    let windows = ms2.precursor_windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].frame_number(), 3);
    assert_eq!(windows[0].first_scan_index(), 1);
    assert_eq!(windows[0].last_scan_index(), 3);

    let stats = file.stats();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.buckets, 6);
    assert_eq!(stats.scans_kept, 12);
    assert_eq!(stats.precursor_windows, 1);
    assert_eq!(stats.diagnostics.synthesized, 4 + 2);

    assert_eq!(task.finished_percentage(), 1.0);
    assert_eq!(task.description(), "Importing run.jsonl, total / parsed is 3 / 3");
}

#[test]
fn test_payloads_resolve_through_storage() {
    let file = import(
        RawFileBuilder::new(SpillFileStorage::new().unwrap()),
        run(),
        MobilityType::Tims,
    )
    .completed()
    .unwrap();

    let frame = file.frame(2).unwrap();
    let real = frame.mobility_scan(1, file.storage()).unwrap().unwrap();
    assert_eq!(real.intensity, vec![10.0, 30.0, 20.0]);
    let gap = frame.mobility_scan(2, file.storage()).unwrap().unwrap();
    assert!(gap.is_empty());
}

#[test]
fn test_drift_tube_axis_stays_ascending() {
    let file = import(RawFileBuilder::new(MemoryStorage::new()), run(), MobilityType::DriftTube)
        .completed()
        .unwrap();

    let axis = file.mobility_axis().unwrap();
    assert!(!axis.is_reversed());
    assert_eq!(axis.buckets()[0].center(), 1.15);

    // descending arrival against an ascending axis is clamped or dropped
    assert!(file.stats().diagnostics.clamped > 0);
    assert!(file.stats().diagnostics.dropped > 0);
    assert!(file.frames().iter().all(|f| f.bucket_count() == 6));
}

#[test]
fn test_waters_lockmass_scans_are_excluded() {
    let mut scans = run();
    let mut lockmass = scan(9, 1, 5.0, Some(1.0));
    lockmass.id = "function=3 process=0 scan=12".to_string();
    scans.push(lockmass);
    scans[0].id = "function=1 process=0 scan=1".to_string();

    let file = import(RawFileBuilder::new(MemoryStorage::new()), scans.clone(), MobilityType::TravellingWave)
        .completed()
        .unwrap();
    assert_eq!(file.stats().excluded_lockmass, 1);
    assert_eq!(file.frames().len(), 3);
    assert_eq!(file.mobility_axis().unwrap().len(), 6);

    let config = ImportConfig {
        exclude_waters_lockmass: false,
        ..Default::default()
    };
    let file = import(
        RawFileBuilder::with_config(MemoryStorage::new(), config),
        scans,
        MobilityType::TravellingWave,
    )
    .completed()
    .unwrap();
    assert_eq!(file.frames().len(), 4);
    assert_eq!(file.mobility_axis().unwrap().len(), 7);
}

#[test]
fn test_waters_function_parsing() {
    assert_eq!(waters_function("function=2 process=0 scan=55"), Some(2));
    assert_eq!(waters_function("merged=1 function=1 process=3 scan=7"), None);
    assert_eq!(waters_function("function=2 scan=55"), None);
    assert_eq!(waters_function("scan=55"), None);
    assert!(is_waters_lockmass_scan("function=3 process=0 scan=1"));
    assert!(is_waters_lockmass_scan("function=11 process=0 scan=1"));
    assert!(!is_waters_lockmass_scan("function=1 process=0 scan=1"));
    assert!(!is_waters_lockmass_scan("frame=1 scan=2"));

    // only the exact id form counts, and function digits start at 1
    assert!(!is_waters_lockmass_scan("function=10 process=0 scan=5"));
    assert!(!is_waters_lockmass_scan("function=0 process=0 scan=5"));
    assert!(!is_waters_lockmass_scan("merged=0 function=2 process=0 scan=5"));
    assert!(!is_waters_lockmass_scan("function=2 process=0 scan=5 extra"));
}

#[test]
fn test_scan_filter_limits_frames() {
    let config = ImportConfig {
        scan_filter: ScanFilter {
            retention_time: Some([0.15, 1.0]),
            ..Default::default()
        },
        ..Default::default()
    };
    let file = import(
        RawFileBuilder::with_config(MemoryStorage::new(), config),
        run(),
        MobilityType::Tims,
    )
    .completed()
    .unwrap();

    assert_eq!(file.frames().len(), 2);
    assert_eq!(file.stats().filtered_out, 6);
    // 1.30 only occurs in the filtered frame
    assert_eq!(file.mobility_axis().unwrap().len(), 5);
}

#[test]
fn test_everything_filtered_is_empty_not_error() {
    let config = ImportConfig {
        scan_filter: ScanFilter {
            ms_levels: Some(vec![3]),
            ..Default::default()
        },
        ..Default::default()
    };
    let outcome = import(
        RawFileBuilder::with_config(MemoryStorage::new(), config),
        run(),
        MobilityType::Tims,
    );

    let ImportOutcome::Empty(empty) = outcome else {
        panic!("expected an empty result");
    };
    assert!(empty.filters_active);
    assert_eq!(empty.scans_seen, 12);
    assert!(empty.to_string().contains("Scan filters were active"));
}

#[test]
fn test_empty_source_reports_filters_off() {
    let outcome = import(RawFileBuilder::new(MemoryStorage::new()), Vec::new(), MobilityType::Tims);
    let ImportOutcome::Empty(empty) = outcome else {
        panic!("expected an empty result");
    };
    assert!(!empty.filters_active);
    assert_eq!(
        empty.to_string(),
        "run.jsonl had 0 scans after import. Scan filters were off."
    );
}

#[test]
fn test_flat_scans_are_sorted_and_renumbered() {
    let scans = vec![
        scan(0, 10, 3.0, None),
        scan(0, 11, 1.0, None),
        scan(0, 12, 2.0, None),
    ];
    let file = import(RawFileBuilder::new(MemoryStorage::new()), scans, MobilityType::None)
        .completed()
        .unwrap();

    assert!(!file.is_ims());
    assert!(file.frames().is_empty());
    assert!(file.stats().resorted);

    let rts: Vec<f32> = file.scans().iter().map(|s| s.retention_time).collect();
    assert_eq!(rts, vec![1.0, 2.0, 3.0]);
    let numbers: Vec<u32> = file.scans().iter().map(|s| s.scan_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(file.scans()[0].id, "frame=0 scan=11");

    let payload = file.scan_payload(&file.scans()[0]).unwrap();
    assert_eq!(payload.mz, vec![300.0, 400.0, 500.0]);
}

#[test]
fn test_ordered_flat_scans_keep_numbers() {
    let scans = vec![scan(0, 5, 1.0, None), scan(0, 9, 2.0, None)];
    let file = import(RawFileBuilder::new(MemoryStorage::new()), scans, MobilityType::Tims)
        .completed()
        .unwrap();
    assert!(!file.stats().resorted);
    assert_eq!(file.scans()[1].scan_number, 9);
    assert_eq!(file.mobility_type(), MobilityType::None);
}

#[test]
fn test_scans_without_mobility_are_skipped_in_ims_files() {
    let mut scans = run();
    scans.insert(3, scan(1, 99, 0.1, None));
    let file = import(RawFileBuilder::new(MemoryStorage::new()), scans, MobilityType::Tims)
        .completed()
        .unwrap();

    assert_eq!(file.stats().without_mobility, 1);
    assert_eq!(file.frames().len(), 3);
    assert_eq!(file.frames()[0].real_scan_count(), 6);
}

#[test]
fn test_cancelled_import_publishes_nothing() {
    let builder = RawFileBuilder::new(MemoryStorage::new());
    builder.task().cancel();
    let outcome = import(builder, run(), MobilityType::Tims);
    assert!(outcome.is_cancelled());
}

#[test]
fn test_invalid_scan_is_skipped() {
    let mut scans = run();
    scans[4].polarity = 2;
    scans[3].intensity_array.pop();

    let file = import(RawFileBuilder::new(MemoryStorage::new()), scans, MobilityType::Tims)
        .completed()
        .unwrap();

    assert_eq!(file.stats().invalid_scans, 2);
    assert_eq!(file.stats().scans_kept, 10);
    assert_eq!(file.frames().len(), 3);
    assert_eq!(file.mobility_axis().unwrap().len(), 6);

    // both skipped buckets of frame 1 are synthesized
    let frame = file.frame(1).unwrap();
    assert_eq!(frame.real_scan_count(), 4);
    assert_eq!(frame.base_peak_indices()[3], NO_DATA);
    assert_eq!(frame.base_peak_indices()[4], NO_DATA);
    assert_eq!(frame.storage_offsets()[4], frame.storage_offsets()[2]);
}

#[test]
fn test_invalid_flat_scan_is_skipped() {
    let mut scans: Vec<_> = (1..=4).map(|i| scan(i, i, i as f32, None)).collect();
    scans[1].ms_level = 0;

    let file = import(RawFileBuilder::new(MemoryStorage::new()), scans, MobilityType::None)
        .completed()
        .unwrap();

    assert_eq!(file.stats().invalid_scans, 1);
    assert_eq!(file.scans().len(), 3);
    assert!(file.scans().iter().all(|s| s.ms_level == 1));
}

struct FailingSource {
    served: usize,
}

impl ScanSource for FailingSource {
    fn name(&self) -> &str {
        "broken.jsonl"
    }

    fn next_scan(&mut self) -> Result<Option<RawMobilityScan>, SourceError> {
        self.served += 1;
        if self.served > 2 {
            return Err(SourceError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated",
            )));
        }
        Ok(Some(scan(1, self.served as u32, 0.1, Some(1.0 + self.served as f64 * 0.1))))
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.served = 0;
        Ok(())
    }
}

#[test]
fn test_read_failure_is_fatal() {
    let err = RawFileBuilder::new(MemoryStorage::new())
        .build(FailingSource { served: 0 }, MobilityType::Tims)
        .err()
        .unwrap();

    assert!(matches!(err, ImportError::Read { .. }));
    assert!(err.to_string().contains("broken.jsonl"));
}

#[test]
fn test_task_description_before_start() {
    let task = ImportTask::new();
    assert_eq!(task.finished_percentage(), 0.0);
    task.set_file_name("a.jsonl");
    assert_eq!(task.description(), "Importing raw data file: a.jsonl");
    task.begin(4);
    task.advance();
    assert_eq!(task.finished_percentage(), 0.25);
    assert_eq!(task.description(), "Importing a.jsonl, total / parsed is 4 / 1");
}

#[test]
fn test_stats_display() {
    let file = import(RawFileBuilder::new(MemoryStorage::new()), run(), MobilityType::Tims)
        .completed()
        .unwrap();
    let line = file.stats().to_string();
    assert!(line.starts_with("3 frames x 6 buckets from 12 of 12 scans"));
}
