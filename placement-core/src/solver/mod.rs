//! Core solver state and the scheduling pipeline.
//!
//! This module contains the [`Instance`] struct, the frozen index-based
//! representation of one scheduling problem. String identifiers from the API
//! input are converted to integer indices once, during construction, and all
//! later stages (ILP build, extraction, validation) work on indices.
//!
//! Every collection here is either a `Vec` indexed by those integers or is
//! iterated through a sorted key list, so variable and constraint insertion
//! order is deterministic. With identical inputs the MIP backend sees an
//! identical model and returns an identical optimum.

mod construction;
mod extract;
mod ilp;
pub mod prefs;
mod validation;

use crate::models::{CapacityWarning, SolverOptions};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Errors that abort a solve.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The input violates a structural invariant (recruiter set mismatch,
    /// broken group partition, preference out of range, ...). Raised before
    /// the solver is invoked; the message names the offending value.
    #[error("invalid input: {0}")]
    ValidationError(String),
    /// The MIP backend finished with a non-optimal status (typically
    /// infeasible when pre-fixed assignments contradict the structural
    /// constraints). No outputs are produced.
    #[error("solver finished with non-optimal status: {0}")]
    Solver(#[from] good_lp::ResolutionError),
}

/// A `(slot, recruiter, candidate)` index triple.
pub type Triple = (usize, usize, usize);

/// The frozen, index-based representation of one scheduling problem.
///
/// Built once by [`Instance::new`], which validates the input and computes
/// every derived quantity; never mutated afterwards. Slots keep their input
/// order (position is temporal order), recruiters and candidates are sorted
/// by identifier, groups are sorted by head identifier.
#[derive(Debug, Clone)]
pub struct Instance {
    // === ID MAPPINGS ===
    /// Slot identifiers in temporal order
    pub slot_ids: Vec<String>,
    /// Recruiter identifiers, sorted
    pub recruiter_ids: Vec<String>,
    /// Candidate identifiers (left-process removed), sorted
    pub candidate_ids: Vec<String>,
    pub slot_idx: HashMap<String, usize>,
    pub recruiter_idx: HashMap<String, usize>,
    pub candidate_idx: HashMap<String, usize>,

    // === STRUCTURE ===
    /// `(recruiter, candidate)` shortlist indicator set
    pub shortlist: HashSet<(usize, usize)>,
    /// `panels[slot][recruiter]` parallel panel count
    pub panels: Vec<Vec<u32>>,
    /// `interview_len[recruiter]` consecutive slots per interview
    pub interview_len: Vec<u32>,
    /// Group member recruiter indices in tuple order; head first.
    /// Groups are sorted by head identifier.
    pub groups: Vec<Vec<usize>>,
    /// `group_of[recruiter]` owning group index
    pub group_of: Vec<usize>,
    /// Resolved pre-fixed triples (only those with a matching variable)
    pub fixed: Vec<Triple>,
    /// Candidate indices barred from the first slot
    pub skip_initial: Vec<usize>,

    // === DERIVED QUANTITIES ===
    /// `max_panels[recruiter]` widest slot, used for output width
    pub max_panels: Vec<u32>,
    /// `crit[candidate]` total shortlist count
    pub crit: Vec<u32>,
    /// Candidate indices entering the ILP (crit above the buffer threshold)
    pub active: Vec<usize>,
    /// Candidate indices held on the buffer list
    pub buffer: Vec<usize>,
    /// `comp_shortlists[recruiter]` shortlisted active candidates
    pub comp_shortlists: Vec<u32>,
    /// `comp_panels[group]` interview throughput of the whole group
    pub comp_panels: Vec<u32>,
    /// `target[group]` slot-count demand the group must satisfy
    pub target: Vec<u32>,
    /// Groups whose shortlist demand exceeds throughput
    pub capacity_warnings: Vec<CapacityWarning>,

    // === PREFERENCES ===
    /// Dense re-ranked preferences: `(candidate, recruiter)` -> rank
    pub rescaled: HashMap<(usize, usize), u32>,
    /// Whether the solve runs in preference-weighted mode
    pub has_prefs: bool,

    pub options: SolverOptions,
}

impl Instance {
    /// Cost of a slot: its 1-based position. Earlier is cheaper.
    pub fn slot_cost(&self, slot: usize) -> u32 {
        slot as u32 + 1
    }

    /// Whether the candidate is in the active partition.
    pub fn is_active(&self, candidate: usize) -> bool {
        self.crit[candidate] > self.options.buffer_threshold
    }

    /// Objective coefficient for one variable.
    ///
    /// Cost-only mode charges the slot cost, pushing assignments early.
    /// Preference mode keeps two branches: for an oversubscribed recruiter the
    /// weight grows with the dense rank and shrinks with slot lateness, so
    /// better-ranked candidates land early while heavily-shortlisted ones can
    /// yield late slots; for a slack recruiter it is the usual rank-discounted
    /// slot cost.
    pub(crate) fn objective_weight(&self, (s, c, n): Triple) -> f64 {
        let cost = f64::from(self.slot_cost(s));
        if !self.has_prefs {
            return cost;
        }
        let rank = match self.rescaled.get(&(n, c)) {
            Some(&r) => f64::from(r),
            None => return cost,
        };
        let denom = match self.options.rank_denominator {
            crate::models::RankDenominator::CritPlusOne => f64::from(self.crit[n] + 1),
            crate::models::RankDenominator::Crit => f64::from(self.crit[n]),
        };
        let g = self.group_of[c];
        let head = self.groups[g][0];
        if self.comp_shortlists[head] > self.comp_panels[g] {
            (rank / denom) * (self.slot_ids.len() as f64 + 1.0 - cost)
        } else {
            (1.0 - rank / denom) * cost
        }
    }

    /// Recruiter assigned to `candidate` in `slot`, if any. At most one by the
    /// mutual-exclusion constraint.
    pub(crate) fn assigned_recruiter(
        &self,
        chosen: &BTreeSet<Triple>,
        slot: usize,
        candidate: usize,
    ) -> Option<usize> {
        (0..self.recruiter_ids.len()).find(|&c| chosen.contains(&(slot, c, candidate)))
    }
}
