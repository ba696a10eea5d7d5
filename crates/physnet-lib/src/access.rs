use crate::error::Error;
use crate::index::{patient_number, PathIndex};
use anyhow::{Context, Result};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Shape of the placeholder per-patient dataset.
pub const SYNTH_CHANNELS: usize = 64;
pub const SYNTH_SAMPLES: usize = 1000;

/// Pre-built catalog of known patients and their record ids, the backing
/// store of the dataset-access facade.
///
/// Loaded explicitly from a JSON file (no import-time side effects) and
/// read-only afterwards; rebuild from a [`PathIndex`] to refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientCatalog {
    patients: BTreeMap<String, Vec<String>>,
}

impl PatientCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("catalog {} is not valid JSON", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn from_index(index: &PathIndex) -> Self {
        let patients = index
            .patients
            .iter()
            .map(|(patient, records)| (patient.clone(), records.keys().cloned().collect()))
            .collect();
        Self { patients }
    }

    /// All known patient ids, sorted.
    pub fn patient_ids(&self) -> Vec<&str> {
        self.patients.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, patient: &str) -> bool {
        self.patients.contains_key(patient)
    }

    pub fn records(&self, patient: &str) -> Option<&[String]> {
        self.patients.get(patient).map(Vec::as_slice)
    }

    /// Dataset for a single patient; unknown ids fail with
    /// [`Error::UnknownPatient`].
    pub fn dataset_for(&self, patient: &str) -> Result<DMatrix<f64>> {
        if !self.contains(patient) {
            return Err(Error::UnknownPatient(patient.to_string()).into());
        }
        let offset = patient_number(patient)? as usize;
        Ok(synthesize_dataset(offset))
    }

    /// Datasets for an ordered collection of patient ids, keyed by id.
    /// Fails on the first unknown id.
    pub fn dataset_by_id<I, S>(&self, patients: I) -> Result<BTreeMap<String, DMatrix<f64>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = BTreeMap::new();
        for patient in patients {
            let patient = patient.as_ref();
            out.insert(patient.to_string(), self.dataset_for(patient)?);
        }
        Ok(out)
    }
}

// TODO: read the recorded signals from a local copy of the dataset
// instead of synthesizing them; the facade keeps the eventual contract
// (matrix per known id, failure per unknown id) so only this function
// has to change.
fn synthesize_dataset(offset: usize) -> DMatrix<f64> {
    let offset = offset.max(1);
    let kernel = DMatrix::from_fn(SYNTH_CHANNELS, SYNTH_CHANNELS, |j, i| {
        let r = ((i + j + offset) % offset) as f64;
        (-(r * r) / 32.0).exp()
    });
    let mut rng = StdRng::from_entropy();
    let noise = DMatrix::from_fn(SYNTH_CHANNELS, SYNTH_SAMPLES, |_, _| rng.gen::<f64>());
    kernel * noise
}
