//! placement-cli: command-line interface for the placement timetable solver.
//!
//! # Commands
//!
//! - `solve`: build and solve the timetable, writing the output CSVs
//! - `validate`: parse the input files and run the structural checks only
//! - `pref-upload`: rank-normalize raw preferences against the shortlists

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use placement_core::models::{
    ProblemDefinition, ScheduleInput, SolverOptions, RankDenominator, ThroughputMode,
    BUFFER_SHORTLIST_THRESHOLD,
};
use placement_core::run_scheduler;
use placement_core::solver::{prefs::rescale_preferences, Instance};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

mod io;

#[derive(Parser)]
#[command(name = "placement-cli")]
#[command(version)]
#[command(about = "Campus placement interview and GD timetable solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// The four mandatory structural inputs plus the optional refinements.
#[derive(clap::Args)]
struct ProblemFiles {
    /// Shortlists per recruiter as CSV
    #[arg(value_name = "Shortlists.csv")]
    shortlists: PathBuf,

    /// Slots and panel counts per recruiter as CSV
    #[arg(value_name = "SlotsPanels.csv")]
    slots_panels: PathBuf,

    /// Consecutive slots required per interview for each recruiter
    #[arg(value_name = "SlotsInterview.csv")]
    slots_interview: PathBuf,

    /// Panel group tuples, one per row
    #[arg(value_name = "GDPanels.csv")]
    gd_panels: PathBuf,

    /// CSV matrix of candidate preferences over recruiters
    #[arg(short, long, value_name = "prefs.csv")]
    prefs: Option<PathBuf>,

    /// Schedule-shaped CSV of pre-fixed assignments
    #[arg(short, long, value_name = "fixed.csv")]
    fixed: Option<PathBuf>,

    /// Candidates who have left the process
    #[arg(short, long, value_name = "lp.csv")]
    left_process: Option<PathBuf>,

    /// Candidates who must not be scheduled in the first slot
    #[arg(short = 'k', long, value_name = "skip.csv")]
    skip_initial: Option<PathBuf>,

    /// Shortlist count at or below which a candidate goes to the buffer list
    #[arg(long, default_value_t = BUFFER_SHORTLIST_THRESHOLD)]
    buffer_threshold: u32,

    /// Treat group throughput targets as upper bounds instead of equalities
    #[arg(long)]
    relaxed_throughput: bool,

    /// Use the legacy crit(n) objective denominator instead of crit(n)+1
    #[arg(long)]
    legacy_denominator: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the timetable and write the output CSVs
    Solve {
        #[command(flatten)]
        files: ProblemFiles,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Also dump the full result (assignments, artifacts, report) as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Parse the input files and run the structural checks without solving
    Validate {
        #[command(flatten)]
        files: ProblemFiles,
    },

    /// Rank-normalize raw preferences against the shortlists
    PrefUpload {
        /// Shortlists per recruiter as CSV
        #[arg(value_name = "Shortlists.csv")]
        shortlists: PathBuf,

        /// CSV matrix of candidate preferences over recruiters
        #[arg(value_name = "prefs.csv")]
        prefs: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "prefsupload.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Solve {
            files,
            output,
            json,
        } => cmd_solve(files, output, json),
        Commands::Validate { files } => cmd_validate(files),
        Commands::PrefUpload {
            shortlists,
            prefs,
            output,
        } => cmd_pref_upload(shortlists, prefs, output),
    }
}

/// Reads every input file into one frozen `ScheduleInput`.
fn load_input(files: &ProblemFiles) -> Result<ScheduleInput> {
    let shortlists = io::read_shortlists(&files.shortlists)?;
    let (slots, panels) = io::read_slots_panels(&files.slots_panels)?;
    let interview_slots = io::read_slots_interview(&files.slots_interview)?;
    let panel_groups = io::read_panel_groups(&files.gd_panels)?;

    let candidates: BTreeSet<&String> = shortlists.values().flatten().collect();
    info!(
        "{} recruiters, {} candidates, {} slots",
        shortlists.len(),
        candidates.len(),
        slots.len()
    );

    let prefs = files.prefs.as_deref().map(io::read_prefs).transpose()?;
    let fixed = match &files.fixed {
        Some(path) => {
            let recruiters: BTreeSet<String> = shortlists.keys().cloned().collect();
            io::read_fixed(path, &recruiters)?
        }
        None => Vec::new(),
    };
    let left_process = files
        .left_process
        .as_deref()
        .map(io::read_name_list)
        .transpose()?
        .unwrap_or_default();
    let skip_initial = files
        .skip_initial
        .as_deref()
        .map(io::read_name_list)
        .transpose()?
        .unwrap_or_default();

    Ok(ScheduleInput {
        problem: ProblemDefinition {
            slots,
            shortlists,
            panels,
            interview_slots,
            panel_groups,
        },
        prefs,
        fixed,
        left_process,
        skip_initial,
        options: SolverOptions {
            buffer_threshold: files.buffer_threshold,
            throughput: if files.relaxed_throughput {
                ThroughputMode::AtMost
            } else {
                ThroughputMode::Equality
            },
            rank_denominator: if files.legacy_denominator {
                RankDenominator::Crit
            } else {
                RankDenominator::CritPlusOne
            },
        },
    })
}

fn cmd_solve(files: ProblemFiles, output: PathBuf, json: Option<PathBuf>) -> Result<()> {
    let input = load_input(&files)?;
    let result = run_scheduler(&input).context("scheduling failed")?;

    io::write_artifacts(&output, &result.artifacts)?;
    info!("schedule written to {}", output.display());

    if !result.report.preference_violations.is_empty() {
        info!(
            "preference order relaxed for {} candidates: {:?}",
            result.report.preference_violations.len(),
            result.report.preference_violations
        );
    }

    if let Some(path) = json {
        let text = serde_json::to_string_pretty(&result)?;
        fs::write(&path, text)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("result dumped to {}", path.display());
    }
    Ok(())
}

fn cmd_validate(files: ProblemFiles) -> Result<()> {
    let input = load_input(&files)?;
    let instance = Instance::new(&input).context("validation failed")?;
    println!(
        "ok: {} active candidates, {} buffered, {} groups",
        instance.active.len(),
        instance.buffer.len(),
        instance.groups.len()
    );
    for w in &instance.capacity_warnings {
        println!(
            "warning: {} has {} shortlists but throughput {}",
            w.recruiter, w.shortlists, w.throughput
        );
    }
    Ok(())
}

fn cmd_pref_upload(shortlists: PathBuf, prefs: PathBuf, output: PathBuf) -> Result<()> {
    let shortlists = io::read_shortlists(&shortlists)?;
    let prefs = io::read_prefs(&prefs)?;
    let rows = rescale_preferences(&shortlists, &prefs)?;
    io::write_prefs_upload(&output, &rows)?;
    info!("{} preference rows written to {}", rows.len(), output.display());
    Ok(())
}
