use crate::error::Error;
use crate::signal::Recording;
use anyhow::{anyhow, bail, Result};
use edfplus::EdfReader;
use std::path::Path;

/// EDF+ stores times as 100 ns ticks.
const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// One annotation from a recording's embedded annotation stream.
#[derive(Debug, Clone)]
pub struct AnnotationEvent {
    /// Onset in seconds
    pub onset: f64,
    /// Duration in seconds; 0 when the file left it unspecified
    pub duration: f64,
    pub description: String,
}

/// Read only the annotation stream of an EDF+ file. The signal data is
/// never touched, so this stays cheap for table building.
pub fn read_annotation_events(path: &Path) -> Result<Vec<AnnotationEvent>> {
    let reader = open(path)?;
    let events = reader
        .annotations()
        .iter()
        .map(|a| AnnotationEvent {
            onset: a.onset as f64 / TICKS_PER_SECOND,
            duration: if a.duration >= 0 {
                a.duration as f64 / TICKS_PER_SECOND
            } else {
                0.0
            },
            description: a.description.clone(),
        })
        .collect();
    Ok(events)
}

/// Load the full signal matrix (channels × samples) of an EDF+ file.
///
/// The sampling rate comes from the first channel's header; all channels
/// are required to carry the same sample count so the matrix is
/// rectangular.
pub fn load_recording(path: &Path) -> Result<Recording> {
    let mut reader = open(path)?;
    let (labels, counts, fs) = {
        let header = reader.header();
        if header.signals.is_empty() {
            bail!("{} contains no signal channels", path.display());
        }
        let record_seconds = header.datarecord_duration as f64 / TICKS_PER_SECOND;
        let fs = header.signals[0].samples_per_record as f64 / record_seconds;
        let labels: Vec<String> = header
            .signals
            .iter()
            .map(|s| s.label.trim().to_string())
            .collect();
        let counts: Vec<usize> = header
            .signals
            .iter()
            .map(|s| (s.samples_per_record as i64 * header.datarecords_in_file) as usize)
            .collect();
        (labels, counts, fs)
    };

    let expected = counts[0];
    let mut channels = Vec::with_capacity(counts.len());
    for (i, count) in counts.iter().enumerate() {
        let samples = reader
            .read_physical_samples(i, *count)
            .map_err(|e| anyhow!("failed to read channel {} of {}: {}", i, path.display(), e))?;
        if samples.len() != expected {
            return Err(Error::ChannelLength {
                label: labels[i].clone(),
                got: samples.len(),
                expected,
            }
            .into());
        }
        channels.push(samples);
    }

    let data = nalgebra::DMatrix::from_fn(channels.len(), expected, |r, c| channels[r][c]);
    Ok(Recording { fs, labels, data })
}

fn open(path: &Path) -> Result<EdfReader> {
    EdfReader::open(path).map_err(|e| anyhow!("failed to open {}: {}", path.display(), e))
}
