use crate::error::Error;
use crate::index::PathIndex;
use crate::io::edf;
use crate::signal::Recording;
use crate::table::AnnotationTable;
use anyhow::{bail, Result};
use log::debug;
use nalgebra::DMatrix;
use std::path::Path;

/// Composite key of one recording. A real pair, so `("S1", "23")` and
/// `("S12", "3")` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub patient: String,
    pub record: String,
}

impl RecordKey {
    pub fn new(patient: &str, record: &str) -> Self {
        Self {
            patient: patient.to_string(),
            record: record.to_string(),
        }
    }
}

/// Seam for loading a full recording from disk.
pub trait RecordingLoader {
    fn load(&self, path: &Path) -> Result<Recording>;
}

/// Production loader backed by the EDF reader.
pub struct EdfLoader;

impl RecordingLoader for EdfLoader {
    fn load(&self, path: &Path) -> Result<Recording> {
        edf::load_recording(path)
    }
}

/// One-slot recording cache. Rows for the same recording are contiguous
/// in a freshly built (or filtered, which preserves order) table, so a
/// single slot is enough to load each recording once.
#[derive(Default)]
pub struct RecordingCache {
    slot: Option<(RecordKey, Recording)>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached recording for `key`, or replace the slot via `load`.
    pub fn get_or_load(
        &mut self,
        key: &RecordKey,
        load: impl FnOnce() -> Result<Recording>,
    ) -> Result<&Recording> {
        let hit = matches!(&self.slot, Some((cached, _)) if cached == key);
        if !hit {
            debug!("loading recording {}/{}", key.patient, key.record);
            self.slot = Some((key.clone(), load()?));
        }
        match &self.slot {
            Some((_, recording)) => Ok(recording),
            None => bail!("recording cache slot empty after load"),
        }
    }
}

/// Extracted segments plus the label columns they join with by position.
#[derive(Debug)]
pub struct AssembledDataset {
    /// One channels × samples slice per table row, table order
    pub segments: Vec<DMatrix<f64>>,
    /// Column name → ordered values, same row order as `segments`
    pub labels: Vec<(&'static str, Vec<String>)>,
}

/// Walk the table rows in order and cut one signal window per row.
///
/// `clip` overrides every row's own duration when given. Windows run
/// from `floor(onset·fs)` to `floor((onset + duration)·fs)` and clamp
/// silently to the recording length.
pub fn assemble_dataset(
    table: &AnnotationTable,
    index: &PathIndex,
    loader: &impl RecordingLoader,
    clip: Option<f64>,
) -> Result<AssembledDataset> {
    let mut cache = RecordingCache::new();
    let mut segments = Vec::with_capacity(table.len());
    for row in table.rows() {
        let key = RecordKey::new(&row.patient, &row.record);
        let recording = cache.get_or_load(&key, || {
            let path = index
                .record_path(&row.patient, &row.record)
                .ok_or_else(|| Error::MissingRecording {
                    patient: row.patient.clone(),
                    record: row.record.clone(),
                })?;
            loader.load(path)
        })?;
        let duration = clip.unwrap_or(row.duration);
        segments.push(recording.segment(row.onset, duration));
    }
    Ok(AssembledDataset {
        segments,
        labels: table.to_columns(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::patient_number;
    use crate::table::{run_metadata, AnnotationRow};
    use std::cell::Cell;
    use std::path::PathBuf;

    struct CountingLoader {
        fs: f64,
        loads: Cell<usize>,
    }

    impl CountingLoader {
        fn new(fs: f64) -> Self {
            Self {
                fs,
                loads: Cell::new(0),
            }
        }
    }

    impl RecordingLoader for CountingLoader {
        fn load(&self, _path: &Path) -> Result<Recording> {
            self.loads.set(self.loads.get() + 1);
            Ok(Recording {
                fs: self.fs,
                labels: vec!["ch0".into(), "ch1".into()],
                data: DMatrix::from_fn(2, 2000, |r, c| (r * 2000 + c) as f64),
            })
        }
    }

    fn row(patient: &str, record: &str, onset: f64, duration: f64) -> AnnotationRow {
        let (task, action) = run_metadata(record).expect("known run");
        AnnotationRow {
            patient: patient.to_string(),
            patient_num: patient_number(patient).unwrap(),
            record: record.to_string(),
            task,
            action,
            onset,
            duration,
            description: "T0".to_string(),
        }
    }

    fn index_for(rows: &[AnnotationRow]) -> PathIndex {
        let mut index = PathIndex::default();
        for r in rows {
            index
                .patients
                .entry(r.patient.clone())
                .or_default()
                .insert(r.record.clone(), PathBuf::from("unused.edf"));
        }
        index
    }

    #[test]
    fn segment_bounds_follow_onset_times_rate() {
        let rows = vec![row("S001", "R03", 1.0, 2.0)];
        let index = index_for(&rows);
        let table = AnnotationTable::from_rows(rows);
        let loader = CountingLoader::new(100.0);
        let out = assemble_dataset(&table, &index, &loader, None).unwrap();
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].nrows(), 2);
        assert_eq!(out.segments[0].ncols(), 200);
        // first sample of the slice is sample 100 of the source
        assert_eq!(out.segments[0][(0, 0)], 100.0);
        assert_eq!(out.segments[0][(1, 199)], 2299.0);
    }

    #[test]
    fn contiguous_rows_share_one_load() {
        let rows = vec![
            row("S001", "R03", 0.0, 1.0),
            row("S001", "R03", 2.0, 1.0),
            row("S001", "R03", 4.0, 1.0),
            row("S001", "R04", 0.0, 1.0),
            row("S002", "R03", 0.0, 1.0),
        ];
        let index = index_for(&rows);
        let table = AnnotationTable::from_rows(rows);
        let loader = CountingLoader::new(100.0);
        let out = assemble_dataset(&table, &index, &loader, None).unwrap();
        assert_eq!(out.segments.len(), 5);
        assert_eq!(loader.loads.get(), 3);
    }

    #[test]
    fn clip_overrides_row_durations() {
        let rows = vec![row("S001", "R03", 0.0, 4.0), row("S001", "R03", 1.0, 4.0)];
        let index = index_for(&rows);
        let table = AnnotationTable::from_rows(rows);
        let loader = CountingLoader::new(100.0);
        let out = assemble_dataset(&table, &index, &loader, Some(0.5)).unwrap();
        assert!(out.segments.iter().all(|s| s.ncols() == 50));
    }

    #[test]
    fn missing_index_entry_fails() {
        let rows = vec![row("S001", "R03", 0.0, 1.0)];
        let table = AnnotationTable::from_rows(rows);
        let index = PathIndex::default();
        let loader = CountingLoader::new(100.0);
        let err = assemble_dataset(&table, &index, &loader, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingRecording { .. })
        ));
    }

    #[test]
    fn labels_join_segments_by_position() {
        let rows = vec![row("S001", "R03", 0.0, 1.0), row("S001", "R04", 1.0, 1.0)];
        let index = index_for(&rows);
        let table = AnnotationTable::from_rows(rows);
        let loader = CountingLoader::new(100.0);
        let out = assemble_dataset(&table, &index, &loader, None).unwrap();
        let records = &out.labels.iter().find(|(c, _)| *c == "record").unwrap().1;
        assert_eq!(records, &vec!["R03".to_string(), "R04".to_string()]);
        assert_eq!(out.segments.len(), records.len());
    }
}
