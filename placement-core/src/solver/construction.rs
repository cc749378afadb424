//! Instance construction: input validation and derived quantities.
//!
//! `Instance::new` converts the string-keyed API input into the frozen
//! index-based problem state, rejecting anything that violates a structural
//! invariant before the solver is ever invoked.

use super::{Instance, ScheduleError};
use crate::models::{CapacityWarning, ScheduleInput};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Returns the sorted identifier list and the id -> index map.
fn index_ids(ids: BTreeSet<String>) -> (Vec<String>, HashMap<String, usize>) {
    let list: Vec<String> = ids.into_iter().collect();
    let map = list
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();
    (list, map)
}

impl Instance {
    /// Builds the frozen problem state from the API input.
    ///
    /// Validates the structural invariants:
    /// 1. the recruiter sets derived from shortlists, panel columns,
    ///    interview lengths and the flattened panel groups are equal;
    /// 2. panel groups partition the recruiter set (no duplicates, no
    ///    stragglers) and every tuple is non-empty;
    /// 3. when preferences are supplied, every rank lies in
    ///    `[1, |recruiters|]` and every remaining candidate has a row;
    /// 4. every interview length is at least 1 and every slot has a panel
    ///    row covering every recruiter.
    ///
    /// Then computes the derived quantities: `max_panels`, `crit`, the
    /// active/buffer partition, `comp_shortlists`, `comp_panels` and each
    /// group's throughput target. Groups whose shortlist demand exceeds their
    /// throughput are logged and recorded; that is a warning, not an error.
    pub fn new(input: &ScheduleInput) -> Result<Self, ScheduleError> {
        let problem = &input.problem;
        let options = input.options.clone();

        if problem.slots.is_empty() {
            return Err(ScheduleError::ValidationError(
                "the slot list is empty".into(),
            ));
        }
        let slot_ids: Vec<String> = problem.slots.clone();
        let mut slot_idx = HashMap::new();
        for (idx, s) in slot_ids.iter().enumerate() {
            if slot_idx.insert(s.clone(), idx).is_some() {
                return Err(ScheduleError::ValidationError(format!(
                    "duplicate slot identifier '{}'",
                    s
                )));
            }
        }

        // Recruiter universe from the shortlist columns; every other input
        // must agree with it.
        let (recruiter_ids, recruiter_idx) =
            index_ids(problem.shortlists.keys().cloned().collect());
        if recruiter_ids.is_empty() {
            return Err(ScheduleError::ValidationError(
                "no recruiters in the shortlists".into(),
            ));
        }

        let interview_recruiters: BTreeSet<String> =
            problem.interview_slots.keys().cloned().collect();
        let shortlist_recruiters: BTreeSet<String> = recruiter_ids.iter().cloned().collect();
        if interview_recruiters != shortlist_recruiters {
            return Err(ScheduleError::ValidationError(format!(
                "recruiter set mismatch between shortlists and interview lengths: {:?}",
                shortlist_recruiters
                    .symmetric_difference(&interview_recruiters)
                    .collect::<Vec<_>>()
            )));
        }

        let mut interview_len = vec![0u32; recruiter_ids.len()];
        for (c, &len) in &problem.interview_slots {
            if len == 0 {
                return Err(ScheduleError::ValidationError(format!(
                    "interview length for recruiter '{}' must be at least 1",
                    c
                )));
            }
            interview_len[recruiter_idx[c]] = len;
        }

        // Panel matrix, [slot][recruiter].
        let mut panels = vec![vec![0u32; recruiter_ids.len()]; slot_ids.len()];
        for (s_idx, s) in slot_ids.iter().enumerate() {
            let row = problem.panels.get(s).ok_or_else(|| {
                ScheduleError::ValidationError(format!("no panel row for slot '{}'", s))
            })?;
            let row_recruiters: BTreeSet<String> = row.keys().cloned().collect();
            if row_recruiters != shortlist_recruiters {
                return Err(ScheduleError::ValidationError(format!(
                    "recruiter set mismatch between shortlists and panel row '{}': {:?}",
                    s,
                    shortlist_recruiters
                        .symmetric_difference(&row_recruiters)
                        .collect::<Vec<_>>()
                )));
            }
            for (c, &p) in row {
                panels[s_idx][recruiter_idx[c]] = p;
            }
        }

        // Panel groups: a total partition of the recruiter set, head first.
        let mut groups: Vec<Vec<usize>> = Vec::with_capacity(problem.panel_groups.len());
        let mut group_of = vec![usize::MAX; recruiter_ids.len()];
        let mut sorted_groups = problem.panel_groups.clone();
        sorted_groups.sort();
        for tuple in &sorted_groups {
            if tuple.is_empty() {
                return Err(ScheduleError::ValidationError(
                    "empty panel group tuple".into(),
                ));
            }
            let g_idx = groups.len();
            let mut members = Vec::with_capacity(tuple.len());
            for c in tuple {
                let c_idx = *recruiter_idx.get(c).ok_or_else(|| {
                    ScheduleError::ValidationError(format!(
                        "panel group member '{}' is not a shortlist recruiter",
                        c
                    ))
                })?;
                if group_of[c_idx] != usize::MAX {
                    return Err(ScheduleError::ValidationError(format!(
                        "recruiter '{}' appears in more than one panel group",
                        c
                    )));
                }
                group_of[c_idx] = g_idx;
                members.push(c_idx);
            }
            groups.push(members);
        }
        if let Some(c_idx) = group_of.iter().position(|&g| g == usize::MAX) {
            return Err(ScheduleError::ValidationError(format!(
                "recruiter '{}' is missing from the panel groups",
                recruiter_ids[c_idx]
            )));
        }

        // Candidate universe: every shortlisted name, minus those who left
        // the process.
        let mut candidate_set: BTreeSet<String> = BTreeSet::new();
        for names in problem.shortlists.values() {
            for n in names {
                if !n.is_empty() && !input.left_process.contains(n) {
                    candidate_set.insert(n.clone());
                }
            }
        }
        let (candidate_ids, candidate_idx) = index_ids(candidate_set);

        let mut shortlist: HashSet<(usize, usize)> = HashSet::new();
        for (c, names) in &problem.shortlists {
            let c_idx = recruiter_idx[c];
            for n in names {
                if let Some(&n_idx) = candidate_idx.get(n) {
                    shortlist.insert((c_idx, n_idx));
                }
            }
        }

        let crit: Vec<u32> = (0..candidate_ids.len())
            .map(|n| {
                (0..recruiter_ids.len())
                    .filter(|&c| shortlist.contains(&(c, n)))
                    .count() as u32
            })
            .collect();

        let mut active = Vec::new();
        let mut buffer = Vec::new();
        for n in 0..candidate_ids.len() {
            if crit[n] > options.buffer_threshold {
                active.push(n);
            } else if crit[n] > 0 {
                buffer.push(n);
            }
        }

        let max_panels: Vec<u32> = (0..recruiter_ids.len())
            .map(|c| (0..slot_ids.len()).map(|s| panels[s][c]).max().unwrap_or(0))
            .collect();

        let comp_shortlists: Vec<u32> = (0..recruiter_ids.len())
            .map(|c| active.iter().filter(|&&n| shortlist.contains(&(c, n))).count() as u32)
            .collect();

        let mut comp_panels = Vec::with_capacity(groups.len());
        let mut target = Vec::with_capacity(groups.len());
        let mut capacity_warnings = Vec::new();
        for members in &groups {
            let head = members[0];
            let len = interview_len[head];
            let total_panels: u32 = members
                .iter()
                .map(|&c| (0..slot_ids.len()).map(|s| panels[s][c]).sum::<u32>())
                .sum();
            let throughput = total_panels / len;
            comp_panels.push(throughput);
            target.push(comp_shortlists[head].min(throughput) * len);
            if comp_shortlists[head] > throughput {
                warn!(
                    "{} has shortlists greater than no of panels {} > {}",
                    recruiter_ids[head], comp_shortlists[head], throughput
                );
                capacity_warnings.push(CapacityWarning {
                    recruiter: recruiter_ids[head].clone(),
                    shortlists: comp_shortlists[head],
                    throughput,
                });
            }
        }

        let mut instance = Instance {
            slot_ids,
            recruiter_ids,
            candidate_ids,
            slot_idx,
            recruiter_idx,
            candidate_idx,
            shortlist,
            panels,
            interview_len,
            groups,
            group_of,
            fixed: Vec::new(),
            skip_initial: Vec::new(),
            max_panels,
            crit,
            active,
            buffer,
            comp_shortlists,
            comp_panels,
            target,
            capacity_warnings,
            rescaled: HashMap::new(),
            has_prefs: false,
            options,
        };

        if let Some(prefs) = &input.prefs {
            instance.check_and_rescale_prefs(prefs)?;
        }

        instance.resolve_fixed(input)?;
        instance.resolve_skip_initial(input);

        Ok(instance)
    }

    /// Resolves the pre-fixed pins to index triples. Unknown slots or
    /// recruiters are fatal; a pin on a candidate with no matching variable
    /// (buffered, left the process, or not shortlisted) is skipped with a
    /// warning.
    fn resolve_fixed(&mut self, input: &ScheduleInput) -> Result<(), ScheduleError> {
        for pin in &input.fixed {
            let s = *self.slot_idx.get(&pin.slot).ok_or_else(|| {
                ScheduleError::ValidationError(format!(
                    "pre-fixed assignment names unknown slot '{}'",
                    pin.slot
                ))
            })?;
            let c = *self.recruiter_idx.get(&pin.recruiter).ok_or_else(|| {
                ScheduleError::ValidationError(format!(
                    "pre-fixed assignment names unknown recruiter '{}'",
                    pin.recruiter
                ))
            })?;
            let n = match self.candidate_idx.get(&pin.candidate) {
                Some(&n) => n,
                None => {
                    warn!(
                        "skipping pre-fixed assignment for '{}': not an eligible candidate",
                        pin.candidate
                    );
                    continue;
                }
            };
            if !self.is_active(n) || !self.shortlist.contains(&(c, n)) {
                warn!(
                    "skipping pre-fixed assignment ({}, {}, {}): no matching variable",
                    pin.slot, pin.recruiter, pin.candidate
                );
                continue;
            }
            self.fixed.push((s, c, n));
        }
        Ok(())
    }

    fn resolve_skip_initial(&mut self, input: &ScheduleInput) {
        for name in &input.skip_initial {
            match self.candidate_idx.get(name) {
                Some(&n) => self.skip_initial.push(n),
                None => debug!("skip-initial candidate '{}' is not in the problem", name),
            }
        }
        self.skip_initial.sort_unstable();
    }
}
