//! Data models and types for the placement-core API.
//!
//! This module contains the public data structures used to define a scheduling
//! problem, tune the solve, and receive results. Everything is serde-serializable
//! so problems and results can round-trip through JSON for tooling.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Shortlist count at or below which a candidate is held on the buffer list
/// instead of entering the ILP.
///
/// Candidates with `crit(n) <= BUFFER_SHORTLIST_THRESHOLD` (and at least one
/// shortlist) are emitted per group in the buffer artifact and never consume
/// early slots. This is a policy constant; override it per solve through
/// [`SolverOptions::buffer_threshold`].
pub const BUFFER_SHORTLIST_THRESHOLD: u32 = 2;

/// Complete input specification for one solve.
///
/// The problem definition is mandatory; preferences, pre-fixed assignments and
/// the two exclusion lists are optional refinements. All identifiers are
/// expected to be normalized (see [`normalize_id`]) before they reach the
/// core, so that joins across the different sections succeed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScheduleInput {
    /// The structural problem: slots, shortlists, capacities, groups
    pub problem: ProblemDefinition,
    /// Raw candidate preferences over recruiters, lower rank is better.
    /// When present, the objective switches to preference-weighted mode.
    #[serde(default)]
    pub prefs: Option<PreferenceTable>,
    /// Assignments that must hold with value 1 in the solution
    #[serde(default)]
    pub fixed: Vec<FixedAssignment>,
    /// Candidates to exclude from consideration entirely
    #[serde(default)]
    pub left_process: BTreeSet<String>,
    /// Candidates forbidden from being assigned in the first slot
    #[serde(default)]
    pub skip_initial: BTreeSet<String>,
    /// Solve policy knobs
    #[serde(default)]
    pub options: SolverOptions,
}

/// The structural scheduling problem.
///
/// The recruiter sets derivable from `shortlists`, `panels`,
/// `interview_slots` and the flattened `panel_groups` must be equal;
/// [`crate::solver::Instance::new`] rejects the input otherwise.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProblemDefinition {
    /// Ordered slot identifiers. Position in this list defines temporal
    /// order and is the only thing that matters about a slot.
    pub slots: Vec<String>,
    /// Recruiter -> shortlisted candidates
    pub shortlists: BTreeMap<String, Vec<String>>,
    /// Slot -> recruiter -> number of parallel panels in that slot
    pub panels: BTreeMap<String, BTreeMap<String, u32>>,
    /// Recruiter -> how many consecutive slots one interview occupies
    pub interview_slots: BTreeMap<String, u32>,
    /// Ordered recruiter tuples treated as parallel panels of the head
    /// recruiter. Every recruiter appears in exactly one tuple.
    pub panel_groups: Vec<Vec<String>>,
}

/// Candidate -> recruiter -> raw rank in `[1, |recruiters|]`
pub type PreferenceTable = BTreeMap<String, BTreeMap<String, u32>>;

/// A single pre-fixed `(slot, recruiter, candidate)` pin.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FixedAssignment {
    pub slot: String,
    pub recruiter: String,
    pub candidate: String,
}

/// Policy knobs for one solve.
///
/// The defaults reproduce the consolidated scheduler behavior; the alternate
/// settings exist for reproducing legacy runs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SolverOptions {
    /// Shortlist count at or below which a candidate goes to the buffer list.
    /// Defaults to [`BUFFER_SHORTLIST_THRESHOLD`].
    pub buffer_threshold: u32,
    /// Whether groups must exactly fill their throughput target
    pub throughput: ThroughputMode,
    /// Denominator used in the preference-weighted objective
    pub rank_denominator: RankDenominator,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            buffer_threshold: BUFFER_SHORTLIST_THRESHOLD,
            throughput: ThroughputMode::Equality,
            rank_denominator: RankDenominator::CritPlusOne,
        }
    }
}

/// Throughput constraint shape for each panel group.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThroughputMode {
    /// Total assignments across the group equal the target exactly
    #[default]
    Equality,
    /// Legacy behavior: the target is an upper bound only
    AtMost,
}

/// Denominator in the preference-weighted objective coefficient.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDenominator {
    /// `crit(n) + 1`; never divides by zero
    #[default]
    CritPlusOne,
    /// Legacy `crit(n)`
    Crit,
}

/// One scheduled `(slot, recruiter, candidate)` triple in the solution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub slot: String,
    pub recruiter: String,
    pub candidate: String,
}

/// A rectangular output table: a header row plus data rows.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One row of the first-slot static upload artifact.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StaticUploadRow {
    /// Candidate identifier
    pub name: String,
    /// Group head identifier (the canonical recruiter name)
    pub company: String,
    /// Interview round; always 1 for the single round produced
    pub round: u32,
    /// 1-based position of the assigned recruiter within its group tuple
    pub panel: u32,
}

/// One row of the rank-normalized preference upload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrefsUploadRow {
    pub candidate: String,
    pub recruiter: String,
    /// Dense rank over the candidate's shortlisted recruiters, starting at 1
    pub rank: u32,
}

/// The four output artifacts of a solve, plus the preference upload rows.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScheduleArtifacts {
    /// Slot x recruiter-panel grid (`sche.csv`)
    pub grid: Table,
    /// Slot x candidate table of assigned recruiters (`names.csv`)
    pub names: Table,
    /// Per group: head identifier followed by its buffered candidates
    /// (`buff.csv`)
    pub buffer: Vec<Vec<String>>,
    /// First-slot fanout rows (`staticupload.csv`), sorted by (company, panel)
    pub static_upload: Vec<StaticUploadRow>,
    /// Dense re-ranked preferences (`prefsupload.csv`); empty when the solve
    /// ran without preferences
    pub prefs_upload: Vec<PrefsUploadRow>,
}

/// A candidate whose multi-slot assignment does not tile into whole
/// interviews.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContiguityViolation {
    pub recruiter: String,
    pub candidate: String,
    /// Length of the offending run of consecutive assigned slots
    pub run_len: u32,
    /// Required interview length for this recruiter
    pub interview_len: u32,
}

/// A group whose shortlist demand exceeds its interview throughput.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CapacityWarning {
    /// Group head identifier
    pub recruiter: String,
    /// Active candidates shortlisted by the head
    pub shortlists: u32,
    /// Interviews the group can conduct across all its panels
    pub throughput: u32,
}

/// Post-solve diagnostics. None of these fail the solve.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ValidationReport {
    /// Candidates whose preference order regresses across slots. Non-empty
    /// only in preference mode; it means the soft ordering was relaxed for
    /// those candidates.
    pub preference_violations: Vec<String>,
    /// Multi-slot assignments whose run length is not a multiple of the
    /// interview length. Structurally impossible; guards against solver bugs.
    pub contiguity_violations: Vec<ContiguityViolation>,
    /// Groups with more shortlisted active candidates than throughput
    pub capacity_warnings: Vec<CapacityWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.preference_violations.is_empty() && self.contiguity_violations.is_empty()
    }
}

/// The complete result of one solve.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScheduleResult {
    /// Every chosen triple, ordered by (slot position, recruiter, candidate)
    pub assignments: Vec<Assignment>,
    pub artifacts: ScheduleArtifacts,
    pub report: ValidationReport,
}

/// Normalizes an identifier so that joins across input files succeed.
///
/// Trims surrounding whitespace, lowercases, deletes ASCII punctuation and
/// replaces spaces with `_`. Underscores survive, which makes the function
/// idempotent: `normalize_id(normalize_id(x)) == normalize_id(x)`.
pub fn normalize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| !ch.is_ascii_punctuation() || *ch == '_')
        .map(|ch| if ch == ' ' { '_' } else { ch })
        .collect()
}
