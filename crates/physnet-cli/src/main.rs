use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use physnet_lib::{
    access::PatientCatalog,
    corr::spatial_correlation,
    dataset::{assemble_dataset, EdfLoader},
    index::PathIndex,
    io::{csv as csv_io, download, edf as edf_io, mat as mat_io},
    table::{Action, AnnotationTable, Filter, Task},
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "physnet",
    version,
    about = "PhysioNet eegmmidb access: download, index, annotate, extract"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TaskArg {
    Baseline,
    Executed,
    Imagined,
}

impl From<TaskArg> for Task {
    fn from(value: TaskArg) -> Self {
        match value {
            TaskArg::Baseline => Task::Baseline,
            TaskArg::Executed => Task::Executed,
            TaskArg::Imagined => Task::Imagined,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ActionArg {
    None,
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
}

impl From<ActionArg> for Action {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::None => Action::None,
            ActionArg::One => Action::One,
            ActionArg::Two => Action::Two,
        }
    }
}

#[derive(Args)]
struct FilterArgs {
    /// Keep rows of this patient id
    #[arg(long)]
    patient: Option<String>,
    /// Keep rows of this record id
    #[arg(long)]
    record: Option<String>,
    /// Keep rows of this task kind
    #[arg(long)]
    task: Option<TaskArg>,
    /// Keep rows of this action code
    #[arg(long)]
    action: Option<ActionArg>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        let mut terms = Vec::new();
        if let Some(patient) = &self.patient {
            terms.push(Filter::Patient(patient.clone()));
        }
        if let Some(record) = &self.record {
            terms.push(Filter::Record(record.clone()));
        }
        if let Some(task) = self.task {
            terms.push(Filter::Task(task.into()));
        }
        if let Some(action) = self.action {
            terms.push(Filter::Action(action.into()));
        }
        Filter::All(terms)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download one recording from the remote repository
    Download {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        record: String,
        /// Dataset root; the {root}/{patient}/ directory must exist
        #[arg(long)]
        root: PathBuf,
    },
    /// List patient ids found under a dataset root
    Patients {
        #[arg(long)]
        root: PathBuf,
    },
    /// Build the annotation table and export it as CSV
    BuildTable {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        dest: PathBuf,
        #[arg(long, default_value = "tabla")]
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Extract one signal window per table row into MAT files
    Assemble {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        dest: PathBuf,
        /// Fixed window length in seconds, overriding row durations
        #[arg(long)]
        clip: Option<f64>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Spatial correlation matrix of one recording
    Corr {
        #[arg(long)]
        edf: PathBuf,
        #[arg(long)]
        dest: PathBuf,
        #[arg(long, default_value = "corr")]
        name: String,
    },
    /// Build the patient catalog JSON from a dataset root
    Catalog {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// List patient ids from a catalog file
    ListPatients {
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Fetch per-patient datasets through the access facade
    Fetch {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        dest: PathBuf,
        /// Patient ids to fetch
        ids: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Download {
            patient,
            record,
            root,
        } => cmd_download(&patient, &record, &root)?,
        Commands::Patients { root } => cmd_patients(&root)?,
        Commands::BuildTable {
            root,
            dest,
            name,
            filter,
        } => cmd_build_table(&root, &dest, &name, &filter)?,
        Commands::Assemble {
            root,
            dest,
            clip,
            filter,
        } => cmd_assemble(&root, &dest, clip, &filter)?,
        Commands::Corr { edf, dest, name } => cmd_corr(&edf, &dest, &name)?,
        Commands::Catalog { root, out } => cmd_catalog(&root, &out)?,
        Commands::ListPatients { catalog } => cmd_list_patients(&catalog)?,
        Commands::Fetch { catalog, dest, ids } => cmd_fetch(&catalog, &dest, &ids)?,
    }
    Ok(())
}

fn cmd_download(patient: &str, record: &str, root: &Path) -> Result<()> {
    match download::download_record(patient, record, root)? {
        Some(path) => println!("{}", path.display()),
        None => println!("patient or record not found: {patient}{record}"),
    }
    Ok(())
}

fn cmd_patients(root: &Path) -> Result<()> {
    let index = PathIndex::scan(root)?;
    println!("{}", serde_json::to_string(&index.patient_ids())?);
    Ok(())
}

fn filtered_table(root: &Path, filter: &FilterArgs) -> Result<(PathIndex, AnnotationTable)> {
    let index = PathIndex::scan(root)?;
    let mut table = AnnotationTable::build(&index)?;
    table.filter(&filter.to_filter());
    Ok((index, table))
}

fn cmd_build_table(root: &Path, dest: &Path, name: &str, filter: &FilterArgs) -> Result<()> {
    let (_, table) = filtered_table(root, filter)?;
    let path = csv_io::save_columns_csv(&table.to_columns(), name, dest)?;
    log::info!("{} rows -> {}", table.len(), path.display());
    println!("{}", path.display());
    Ok(())
}

fn cmd_assemble(root: &Path, dest: &Path, clip: Option<f64>, filter: &FilterArgs) -> Result<()> {
    let (index, table) = filtered_table(root, filter)?;
    let out = assemble_dataset(&table, &index, &EdfLoader, clip)?;
    let named: Vec<(String, _)> = out
        .segments
        .iter()
        .zip(table.rows())
        .enumerate()
        .map(|(i, (segment, row))| (format!("{}{}_{i:04}", row.patient, row.record), segment))
        .collect();
    mat_io::save_arrays(named.iter().map(|(n, s)| (n.as_str(), *s)), dest)?;
    csv_io::save_columns_csv(&out.labels, "labels", dest)?;
    println!("{} segments -> {}", out.segments.len(), dest.display());
    Ok(())
}

fn cmd_corr(edf: &Path, dest: &Path, name: &str) -> Result<()> {
    let recording = edf_io::load_recording(edf)?;
    let corr = spatial_correlation(&recording.data);
    mat_io::save_arrays([(name, &corr)], dest)?;
    println!("{}", dest.join(format!("{name}.mat")).display());
    Ok(())
}

fn cmd_catalog(root: &Path, out: &Path) -> Result<()> {
    let index = PathIndex::scan(root)?;
    let catalog = PatientCatalog::from_index(&index);
    catalog.save(out)?;
    println!("{} patients -> {}", catalog.patient_ids().len(), out.display());
    Ok(())
}

fn cmd_list_patients(catalog: &Path) -> Result<()> {
    let catalog = PatientCatalog::load(catalog)?;
    println!("{}", serde_json::to_string(&catalog.patient_ids())?);
    Ok(())
}

fn cmd_fetch(catalog: &Path, dest: &Path, ids: &[String]) -> Result<()> {
    let catalog = PatientCatalog::load(catalog)?;
    let datasets = catalog.dataset_by_id(ids)?;
    mat_io::save_arrays(
        datasets.iter().map(|(id, matrix)| (id.as_str(), matrix)),
        dest,
    )?;
    for (id, matrix) in &datasets {
        println!("{id}: {}x{}", matrix.nrows(), matrix.ncols());
    }
    Ok(())
}
