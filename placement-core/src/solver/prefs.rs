//! Preference rescaling.
//!
//! Raw preferences rank every recruiter, but a candidate only ever interviews
//! the recruiters that shortlisted them. Rescaling restricts each candidate's
//! ranking to their shortlist and re-emits it as a dense `1..k` sequence, which
//! both the objective and the post-solve order check consume.

use super::{Instance, ScheduleError};
use crate::models::{PreferenceTable, PrefsUploadRow};
use std::collections::BTreeMap;

impl Instance {
    /// Validates the raw preference table and computes the dense re-ranking
    /// for every active candidate.
    ///
    /// Fatal if any rank falls outside `[1, |recruiters|]`, if a remaining
    /// candidate has no preference row, or if a candidate's row is missing a
    /// recruiter they are shortlisted by.
    pub(super) fn check_and_rescale_prefs(
        &mut self,
        prefs: &PreferenceTable,
    ) -> Result<(), ScheduleError> {
        let bound = self.recruiter_ids.len() as u32;
        for (n, row) in prefs {
            for (c, &rank) in row {
                if rank < 1 || rank > bound {
                    return Err(ScheduleError::ValidationError(format!(
                        "preference {} for ({}, {}) is out of range; it should be between 1 and {}",
                        rank, n, c, bound
                    )));
                }
            }
        }

        let missing: Vec<&String> = self
            .candidate_ids
            .iter()
            .filter(|n| !prefs.contains_key(*n))
            .collect();
        if !missing.is_empty() {
            return Err(ScheduleError::ValidationError(format!(
                "preferences are missing for candidates {:?}",
                missing
            )));
        }

        for &n in &self.active {
            let name = &self.candidate_ids[n];
            let row = &prefs[name];
            // Restrict to the candidate's shortlist, then sort by raw rank
            // with the recruiter identifier as the tie-break.
            let mut restricted: Vec<(u32, usize)> = Vec::new();
            for c in 0..self.recruiter_ids.len() {
                if !self.shortlist.contains(&(c, n)) {
                    continue;
                }
                let raw = *row.get(&self.recruiter_ids[c]).ok_or_else(|| {
                    ScheduleError::ValidationError(format!(
                        "preference row for '{}' is missing recruiter '{}'",
                        name, self.recruiter_ids[c]
                    ))
                })?;
                restricted.push((raw, c));
            }
            restricted.sort_unstable();
            for (rank0, &(_, c)) in restricted.iter().enumerate() {
                self.rescaled.insert((n, c), rank0 as u32 + 1);
            }
        }
        self.has_prefs = true;
        Ok(())
    }

    /// Dense re-ranked preferences as upload rows, sorted by
    /// (candidate, recruiter).
    pub(crate) fn prefs_upload_rows(&self) -> Vec<PrefsUploadRow> {
        let mut rows: Vec<PrefsUploadRow> = self
            .rescaled
            .iter()
            .map(|(&(n, c), &rank)| PrefsUploadRow {
                candidate: self.candidate_ids[n].clone(),
                recruiter: self.recruiter_ids[c].clone(),
                rank,
            })
            .collect();
        rows.sort_by(|a, b| (&a.candidate, &a.recruiter).cmp(&(&b.candidate, &b.recruiter)));
        rows
    }
}

/// Rank-normalizes raw preferences against the shortlists, standalone.
///
/// This is the preference-upload transform: for every shortlisted candidate,
/// restrict their raw ranking to the recruiters that shortlisted them and
/// re-emit it densely from 1, ties broken by recruiter identifier. Unlike a
/// solve, no buffer threshold applies; every candidate with at least one
/// shortlist gets rows.
pub fn rescale_preferences(
    shortlists: &BTreeMap<String, Vec<String>>,
    prefs: &PreferenceTable,
) -> Result<Vec<PrefsUploadRow>, ScheduleError> {
    let bound = shortlists.len() as u32;
    for (n, row) in prefs {
        for (c, &rank) in row {
            if rank < 1 || rank > bound {
                return Err(ScheduleError::ValidationError(format!(
                    "preference {} for ({}, {}) is out of range; it should be between 1 and {}",
                    rank, n, c, bound
                )));
            }
        }
    }

    // candidate -> shortlisting recruiters
    let mut by_candidate: BTreeMap<&String, std::collections::BTreeSet<&String>> = BTreeMap::new();
    for (c, names) in shortlists {
        for n in names {
            if !n.is_empty() {
                by_candidate.entry(n).or_default().insert(c);
            }
        }
    }

    let missing: Vec<&&String> = by_candidate
        .keys()
        .filter(|n| !prefs.contains_key(**n))
        .collect();
    if !missing.is_empty() {
        return Err(ScheduleError::ValidationError(format!(
            "preferences are missing for candidates {:?}",
            missing
        )));
    }

    let mut rows = Vec::new();
    for (n, recruiters) in &by_candidate {
        let row = &prefs[*n];
        let mut restricted: Vec<(u32, &String)> = Vec::new();
        for c in recruiters {
            let raw = *row.get(*c).ok_or_else(|| {
                ScheduleError::ValidationError(format!(
                    "preference row for '{}' is missing recruiter '{}'",
                    n, c
                ))
            })?;
            restricted.push((raw, c));
        }
        restricted.sort_unstable();
        for (rank0, (_, c)) in restricted.iter().enumerate() {
            rows.push(PrefsUploadRow {
                candidate: (*n).clone(),
                recruiter: (*c).clone(),
                rank: rank0 as u32 + 1,
            });
        }
    }
    Ok(rows)
}
