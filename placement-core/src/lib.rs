//! # placement-core: campus placement interview & GD timetable engine
//!
//! This crate schedules shortlisted candidates onto recruiter interview panels
//! across an ordered sequence of time slots. It builds a binary integer linear
//! program over sparse (slot, recruiter, candidate) triples, solves it with a
//! MIP backend, and decomposes the optimum into per-recruiter and
//! per-candidate timetables, a standby buffer list, and the first-slot upload
//! feed.
//!
//! ## Quick example
//!
//! ```no_run
//! use placement_core::{run_scheduler, models::*};
//! use std::collections::BTreeMap;
//!
//! let mut shortlists = BTreeMap::new();
//! shortlists.insert("acme".to_string(), vec!["alice".to_string(), "bob".to_string()]);
//!
//! let mut panels = BTreeMap::new();
//! for slot in ["slot_00", "slot_01"] {
//!     panels.insert(slot.to_string(), BTreeMap::from([("acme".to_string(), 1u32)]));
//! }
//!
//! let input = ScheduleInput {
//!     problem: ProblemDefinition {
//!         slots: vec!["slot_00".to_string(), "slot_01".to_string()],
//!         shortlists,
//!         panels,
//!         interview_slots: BTreeMap::from([("acme".to_string(), 1u32)]),
//!         panel_groups: vec![vec!["acme".to_string()]],
//!     },
//!     prefs: None,
//!     fixed: vec![],
//!     left_process: Default::default(),
//!     skip_initial: Default::default(),
//!     options: SolverOptions { buffer_threshold: 0, ..Default::default() },
//! };
//!
//! match run_scheduler(&input) {
//!     Ok(result) => println!("{} assignments", result.assignments.len()),
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```

use crate::models::{ScheduleInput, ScheduleResult};
use crate::solver::{Instance, ScheduleError};

pub mod models;
pub mod solver;

/// Runs the full scheduling pipeline on one frozen input.
///
/// Validates the input and computes the derived quantities, rescales the
/// preferences when present, builds and solves the ILP, extracts the output
/// artifacts, and runs the post-solve checks.
///
/// # Errors
///
/// Returns [`ScheduleError::ValidationError`] when the input violates a
/// structural invariant (the solver is never invoked), and
/// [`ScheduleError::Solver`] when the MIP backend finishes non-optimal —
/// typically because pre-fixed assignments contradict the structural
/// constraints. In both cases no artifacts are produced.
pub fn run_scheduler(input: &ScheduleInput) -> Result<ScheduleResult, ScheduleError> {
    let instance = Instance::new(input)?;
    let chosen = instance.solve_assignment()?;
    let artifacts = instance.extract_artifacts(&chosen);
    let report = instance.validate_solution(&chosen);
    Ok(ScheduleResult {
        assignments: instance.extract_assignments(&chosen),
        artifacts,
        report,
    })
}
