use crate::infra::engine_for;
use clap::Args;
use club_allocator::config::{AllocationConfig, AppConfig};
use club_allocator::error::AppError;
use club_allocator::telemetry;
use club_allocator::workflows::allocation::{AllocationOutcome, AllocationSummary};
use club_allocator::workflows::export::{write_clubs_csv, write_pupils_csv};
use club_allocator::workflows::intake::{
    load_history_from_path, IntakeOptions, SubmissionImporter,
};
use club_allocator::workflows::storage::{CapacityStore, JsonFileCapacityStore};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Submissions CSV (Time, Name, Class, preferences.., Count)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Previous session's pupils.csv, used to deprioritise repeat first choices
    #[arg(long)]
    pub(crate) history: Option<PathBuf>,
    /// Capacity store to load (defaults to ALLOC_CAPACITY_STORE)
    #[arg(long)]
    pub(crate) capacities: Option<PathBuf>,
    /// Fixed number of allocation rounds
    #[arg(long)]
    pub(crate) rounds: Option<usize>,
    /// Directory receiving pupils.csv, clubs.csv and allocation.json
    #[arg(long, default_value = ".")]
    pub(crate) out_dir: PathBuf,
    /// Persist the session's capacities back to the store
    #[arg(long)]
    pub(crate) save_capacities: bool,
}

#[derive(Debug)]
pub(crate) struct BatchReport {
    pub(crate) outcome: AllocationOutcome,
    pub(crate) summary: AllocationSummary,
    pub(crate) written: Vec<PathBuf>,
}

pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let report = allocate_batch(args, &config.allocation)?;
    render_report(&report);
    Ok(())
}

/// Load, apply stored capacities, allocate, then write every export.
pub(crate) fn allocate_batch(
    args: AllocateArgs,
    settings: &AllocationConfig,
) -> Result<BatchReport, AppError> {
    let AllocateArgs {
        input,
        history,
        capacities,
        rounds,
        out_dir,
        save_capacities,
    } = args;

    let history = match history {
        Some(path) => load_history_from_path(path)?,
        None => Default::default(),
    };
    let options = IntakeOptions {
        default_capacity: settings.default_capacity,
        history,
    };
    let mut session = SubmissionImporter::from_path(&input, &options)?;

    let store = JsonFileCapacityStore::new(
        capacities.unwrap_or_else(|| settings.capacity_store.clone()),
    );
    let mut stored = store.load()?;
    session.apply_capacities(&stored);

    let settings = AllocationConfig {
        rounds: rounds.or(settings.rounds),
        ..settings.clone()
    };
    let outcome = session.allocate(&engine_for(&settings));

    fs::create_dir_all(&out_dir)?;
    let pupils_path = out_dir.join("pupils.csv");
    write_pupils_csv(&session, BufWriter::new(File::create(&pupils_path)?))?;
    let clubs_path = out_dir.join("clubs.csv");
    write_clubs_csv(&session, BufWriter::new(File::create(&clubs_path)?))?;
    let snapshot_path = out_dir.join("allocation.json");
    let snapshot = serde_json::to_vec_pretty(&session.snapshot()).map_err(std::io::Error::from)?;
    fs::write(&snapshot_path, snapshot)?;

    if save_capacities {
        stored.merge(&session.capacities());
        store.save(&stored)?;
    }

    info!(
        input = %input.display(),
        out_dir = %out_dir.display(),
        commits = outcome.commits,
        "batch allocation written"
    );

    Ok(BatchReport {
        outcome,
        summary: session.summary(),
        written: vec![pupils_path, clubs_path, snapshot_path],
    })
}

fn render_report(report: &BatchReport) {
    let BatchReport {
        outcome,
        summary,
        written,
    } = report;

    println!("Club allocation");
    println!(
        "- {} pupils | {} allocations over {} rounds | {} waitlist entries",
        summary.pupils, summary.allocations, outcome.rounds, outcome.waitlist_entries
    );

    println!("Club fill:");
    for club in &summary.clubs {
        let marker = if club.full { " FULL" } else { "" };
        println!(
            "  - {} term {}: {}/{}{} ({} waitlisted)",
            club.description, club.term_band, club.allocated, club.maximum, marker, club.waitlisted
        );
    }

    if summary.unfilled_pupils.is_empty() {
        println!("Every pupil reached their requested number of clubs.");
    } else {
        println!("Pupils below their requested number of clubs:");
        for pupil in &summary.unfilled_pupils {
            println!(
                "  - {} ({}): {}/{}",
                pupil.name, pupil.class, pupil.allocated, pupil.quota
            );
        }
    }

    println!("Written:");
    for path in written {
        println!("  - {}", path.display());
    }
}
