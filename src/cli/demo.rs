use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use imsframe::ingest::{PrecursorEntry, RawMobilityScan};
use imsframe::source::write_json_lines;

const BUCKETS: usize = 48;
const TOP_MOBILITY: f64 = 1.45;
const MOBILITY_STEP: f64 = 0.016;
const CYCLE_LENGTH: u32 = 5;

/// Generate a synthetic TIMS run
pub fn run(output: PathBuf, frames: u32) -> Result<()> {
    info!("imsframe demo - synthetic TIMS run");
    info!("==================================");

    let scans = generate_mock_tims_run(frames);
    info!(
        "Writing {} mobility scans in {} frames to {}",
        scans.len(),
        frames,
        output.display()
    );

    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let written = write_json_lines(BufWriter::new(file), scans)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {written} scans to {}", output.display());
    println!("Import with: imsframe import {} --instrument tims", output.display());
    Ok(())
}

/// One MS1 frame per cycle, PASEF-like MS2 frames in between; empty scans are omitted.
fn generate_mock_tims_run(frames: u32) -> Vec<RawMobilityScan> {
    let mut scans = Vec::new();

    for frame in 1..=frames {
        let retention_time = frame as f32 * 0.11;
        let ms_level = if frame % CYCLE_LENGTH == 1 { 1 } else { 2 };
        let windows = pasef_windows(frame);

        for bucket in 0..BUCKETS {
            if is_omitted(frame, bucket) {
                continue;
            }

            // sub-cluster jitter, as reported by real instruments
            let jitter = (frame as f64 * 0.37 + bucket as f64).sin() * 1e-7;
            let mobility = TOP_MOBILITY - bucket as f64 * MOBILITY_STEP + jitter;

            let precursors = if ms_level == 2 {
                windows
                    .iter()
                    .filter(|(range, _)| range.contains(&bucket))
                    .map(|(_, entry)| entry.clone())
                    .collect()
            } else {
                Vec::new()
            };

            let (mz_array, intensity_array) = generate_peaks(frame, bucket, ms_level);
            scans.push(RawMobilityScan {
                id: format!("frame={frame} scan={}", bucket + 1),
                frame_index: frame,
                scan_number: bucket as u32 + 1,
                ms_level,
                retention_time,
                polarity: 1,
                mobility: Some(mobility),
                mz_array,
                intensity_array,
                precursors,
            });
        }
    }

    scans
}

fn is_omitted(frame: u32, bucket: usize) -> bool {
    (frame as usize * 31 + bucket * 17) % 7 == 0
}

fn pasef_windows(frame: u32) -> Vec<(std::ops::RangeInclusive<usize>, PrecursorEntry)> {
    let shift = (frame % 4) as f64 * 10.0;
    vec![
        (
            6..=17,
            PrecursorEntry {
                isolation_mz: Some(550.25 + shift),
                isolation_lower_offset: Some(1.0),
                isolation_upper_offset: Some(1.0),
                selected_ion_mz: Some(550.27 + shift),
                charge: Some(2),
                collision_energy: Some(27.0),
            },
        ),
        (
            26..=39,
            PrecursorEntry {
                isolation_mz: Some(820.5 + shift),
                isolation_lower_offset: Some(1.5),
                isolation_upper_offset: Some(1.5),
                selected_ion_mz: None,
                charge: if frame % 3 == 0 { None } else { Some(3) },
                collision_energy: Some(38.0),
            },
        ),
    ]
}

fn generate_peaks(frame: u32, bucket: usize, ms_level: u8) -> (Vec<f64>, Vec<f64>) {
    let count = if ms_level == 1 { 24 } else { 12 };
    let seed = frame as f64 * 0.789 + bucket as f64 * 0.123;

    let mz = (0..count)
        .map(|i| 150.0 + i as f64 * 55.0 + (seed + i as f64).sin() * 0.01)
        .collect();
    let intensity = (0..count)
        .map(|i| 1e4 * (0.1 + (seed * 0.456 + i as f64).sin().abs() * 0.9))
        .collect();
    (mz, intensity)
}
