use crate::error::Error;
use crate::index::{patient_number, PathIndex};
use crate::io::edf;
use anyhow::Result;
use std::fmt;

/// Column names of the flattened annotation table, in export order.
/// These match the original eegmmidb tooling so downstream CSV consumers
/// keep working.
pub const COLUMNS: [&str; 8] = [
    "paciente",
    "numero_paciente",
    "record",
    "tipo",
    "accion",
    "tiempo",
    "duracion",
    "descripcion",
];

/// Task kind of a run. String forms are the historical labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Baseline,
    Executed,
    Imagined,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Baseline => "baseline",
            Task::Executed => "Realizada",
            Task::Imagined => "Imaginada",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action code of a run: `1` is the fists task, `2` the fists/feet task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    One,
    Two,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::None => "None",
            Action::One => "1",
            Action::Two => "2",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed task/action metadata for the 14 eegmmidb runs.
pub fn run_metadata(record: &str) -> Option<(Task, Action)> {
    let meta = match record {
        "R01" | "R02" => (Task::Baseline, Action::None),
        "R03" | "R07" | "R11" => (Task::Executed, Action::One),
        "R04" | "R08" | "R12" => (Task::Imagined, Action::One),
        "R05" | "R09" | "R13" => (Task::Executed, Action::Two),
        "R06" | "R10" | "R14" => (Task::Imagined, Action::Two),
        _ => return None,
    };
    Some(meta)
}

/// One annotation event from one recording.
#[derive(Debug, Clone)]
pub struct AnnotationRow {
    pub patient: String,
    pub patient_num: u32,
    pub record: String,
    pub task: Task,
    pub action: Action,
    /// Onset in seconds from the start of the recording
    pub onset: f64,
    /// Duration in seconds (0 when the file left it open)
    pub duration: f64,
    pub description: String,
}

/// Structured row predicate. Replaces the string-evaluated query
/// expressions of the original tooling with a typed expression tree;
/// `Filter::All(vec![])` matches everything.
#[derive(Debug, Clone)]
pub enum Filter {
    Patient(String),
    Record(String),
    Task(Task),
    Action(Action),
    DescriptionEq(String),
    All(Vec<Filter>),
    Any(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn matches(&self, row: &AnnotationRow) -> bool {
        match self {
            Filter::Patient(id) => row.patient == *id,
            Filter::Record(id) => row.record == *id,
            Filter::Task(task) => row.task == *task,
            Filter::Action(action) => row.action == *action,
            Filter::DescriptionEq(text) => row.description == *text,
            Filter::All(filters) => filters.iter().all(|f| f.matches(row)),
            Filter::Any(filters) => filters.iter().any(|f| f.matches(row)),
            Filter::Not(inner) => !inner.matches(row),
        }
    }
}

/// Flattened table of every annotation across every indexed recording,
/// one row per event, in (patient, record, annotation) order.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    rows: Vec<AnnotationRow>,
}

impl AnnotationTable {
    pub fn from_rows(rows: Vec<AnnotationRow>) -> Self {
        Self { rows }
    }

    /// Build the table eagerly from every recording in the index.
    ///
    /// A record id outside the fixed run table aborts with
    /// [`Error::UnknownRun`]; a malformed EDF file aborts with whatever
    /// the parser reports. There is no skip-and-continue mode.
    pub fn build(index: &PathIndex) -> Result<Self> {
        let mut rows = Vec::new();
        for (patient, records) in &index.patients {
            let patient_num = patient_number(patient)?;
            for (record, path) in records {
                let (task, action) =
                    run_metadata(record).ok_or_else(|| Error::UnknownRun(record.clone()))?;
                for event in edf::read_annotation_events(path)? {
                    rows.push(AnnotationRow {
                        patient: patient.clone(),
                        patient_num,
                        record: record.clone(),
                        task,
                        action,
                        onset: event.onset,
                        duration: event.duration,
                        description: event.description,
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[AnnotationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the rows the filter accepts, preserving order.
    pub fn filter(&mut self, filter: &Filter) {
        self.rows.retain(|row| filter.matches(row));
    }

    /// Closure escape hatch for conditions the `Filter` tree cannot say.
    pub fn retain(&mut self, mut predicate: impl FnMut(&AnnotationRow) -> bool) {
        self.rows.retain(|row| predicate(row));
    }

    /// Per-column distinct values, first-seen order.
    pub fn unique_values(&self) -> Vec<(&'static str, Vec<String>)> {
        self.to_columns()
            .into_iter()
            .map(|(name, values)| {
                let mut seen = Vec::new();
                for value in values {
                    if !seen.contains(&value) {
                        seen.push(value);
                    }
                }
                (name, seen)
            })
            .collect()
    }

    /// Column-oriented view of the table: column name → ordered values,
    /// all rendered as strings for positional joining and CSV export.
    pub fn to_columns(&self) -> Vec<(&'static str, Vec<String>)> {
        let rows = &self.rows;
        vec![
            (COLUMNS[0], rows.iter().map(|r| r.patient.clone()).collect()),
            (
                COLUMNS[1],
                rows.iter().map(|r| r.patient_num.to_string()).collect(),
            ),
            (COLUMNS[2], rows.iter().map(|r| r.record.clone()).collect()),
            (COLUMNS[3], rows.iter().map(|r| r.task.to_string()).collect()),
            (
                COLUMNS[4],
                rows.iter().map(|r| r.action.to_string()).collect(),
            ),
            (COLUMNS[5], rows.iter().map(|r| r.onset.to_string()).collect()),
            (
                COLUMNS[6],
                rows.iter().map(|r| r.duration.to_string()).collect(),
            ),
            (
                COLUMNS[7],
                rows.iter().map(|r| r.description.clone()).collect(),
            ),
        ]
    }
}
