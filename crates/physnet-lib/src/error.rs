use thiserror::Error;

/// Domain failures with a name; everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// Run id outside the fixed 14-run eegmmidb table. Fatal to a table build.
    #[error("run {0:?} is not one of the 14 eegmmidb runs (R01..R14)")]
    UnknownRun(String),

    /// Patient id the catalog has never heard of.
    #[error("patient {0:?} is not in the catalog")]
    UnknownPatient(String),

    /// A table row points at a (patient, record) pair the path index lacks.
    #[error("recording {patient}/{record} is not in the path index")]
    MissingRecording { patient: String, record: String },

    /// EDF channels disagree on sample count; the signal matrix must be rectangular.
    #[error("channel {label:?} has {got} samples, expected {expected}")]
    ChannelLength {
        label: String,
        got: usize,
        expected: usize,
    },
}
