use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default test for "this directory is a patient": tag letter `S`
/// followed by the numeric id, four characters total (e.g. `S002`).
pub fn default_patient_predicate(name: &str) -> bool {
    name.starts_with('S') && name.chars().count() == 4
}

/// Numeric part of a patient id (`"S002"` → 2).
pub fn patient_number(id: &str) -> Result<u32> {
    id.get(1..)
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("patient id {id:?} has no numeric part"))
}

/// Map of patient id → record id → path of that record's EDF file.
///
/// Built once from one level of directory listing; rebuild to refresh.
/// Iteration order is sorted, so downstream tables are deterministic
/// regardless of what the filesystem hands back.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    pub patients: BTreeMap<String, BTreeMap<String, PathBuf>>,
}

impl PathIndex {
    /// Scan `root` with the default patient predicate.
    pub fn scan(root: &Path) -> Result<Self> {
        Self::scan_with(root, default_patient_predicate)
    }

    /// Scan `root`, keeping the immediate subdirectories `is_patient`
    /// accepts. Inside each, every `*.edf` file becomes a record, keyed
    /// by its file stem with the patient-id prefix stripped
    /// (`S001R03.edf` → `R03`). No recursion past that one level.
    pub fn scan_with(root: &Path, is_patient: impl Fn(&str) -> bool) -> Result<Self> {
        let mut patients = BTreeMap::new();
        let entries =
            fs::read_dir(root).with_context(|| format!("failed to list {}", root.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.path().is_dir() || !is_patient(&name) {
                continue;
            }
            let mut records = BTreeMap::new();
            let files = fs::read_dir(entry.path())
                .with_context(|| format!("failed to list {}", entry.path().display()))?;
            for file in files {
                let file = file?;
                let file_name = file.file_name().to_string_lossy().into_owned();
                let Some(stem) = file_name.strip_suffix(".edf") else {
                    continue;
                };
                let Some(record) = stem.strip_prefix(name.as_str()) else {
                    continue;
                };
                records.insert(record.to_string(), file.path());
            }
            patients.insert(name, records);
        }
        Ok(Self { patients })
    }

    pub fn patient_ids(&self) -> Vec<&str> {
        self.patients.keys().map(String::as_str).collect()
    }

    pub fn record_path(&self, patient: &str, record: &str) -> Option<&Path> {
        self.patients
            .get(patient)
            .and_then(|records| records.get(record))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}
