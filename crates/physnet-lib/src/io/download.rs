use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fs;
use std::path::{Path, PathBuf};

const SRC_URL_BASE: &str = "https://physionet.org/files/eegmmidb/1.0.0";

/// Deterministic source URL of one recording.
pub fn record_url(patient: &str, record: &str) -> String {
    format!("{SRC_URL_BASE}/{patient}/{patient}{record}.edf")
}

/// Destination path of one recording under `root`.
pub fn record_path(root: &Path, patient: &str, record: &str) -> PathBuf {
    root.join(patient).join(format!("{patient}{record}.edf"))
}

/// Download one recording with a single blocking GET.
///
/// A 404 means the patient/record pair does not exist upstream: nothing
/// is written and `Ok(None)` comes back so batch callers can move on.
/// Any other failure propagates. The caller is responsible for
/// `root/{patient}/` existing; there is no retry and no partial-write
/// protection.
pub fn download_record(patient: &str, record: &str, root: &Path) -> Result<Option<PathBuf>> {
    let url = record_url(patient, record);
    info!("GET {url}");
    let response = Client::new()
        .get(&url)
        .send()
        .with_context(|| format!("GET {url}"))?;
    if response.status() == StatusCode::NOT_FOUND {
        warn!("patient or record not found: {patient}{record}");
        return Ok(None);
    }
    let body = response
        .error_for_status()
        .with_context(|| format!("GET {url}"))?
        .bytes()
        .with_context(|| format!("reading body of {url}"))?;
    let dest = record_path(root, patient, record);
    fs::write(&dest, &body).with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(Some(dest))
}
