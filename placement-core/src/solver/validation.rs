//! Post-solve sanity checks.
//!
//! The ILP already enforces the hard structure, so everything here is a
//! diagnostic: preference-order regressions show where the soft ordering was
//! relaxed, and the contiguity check guards against solver bugs rather than
//! modeling mistakes.

use super::{Instance, Triple};
use crate::models::{ContiguityViolation, ValidationReport};
use log::warn;
use std::collections::BTreeSet;

impl Instance {
    /// Candidates whose assignment sequence regresses in dense rank.
    ///
    /// Walks each active candidate's assignments in slot order and records the
    /// candidate the first time a later interview has a better (smaller) rank
    /// than an earlier one.
    fn preference_violations(&self, chosen: &BTreeSet<Triple>) -> Vec<String> {
        let mut violators = Vec::new();
        for &n in &self.active {
            let mut last = 1u32;
            for s in 0..self.slot_ids.len() {
                let Some(c) = self.assigned_recruiter(chosen, s, n) else {
                    continue;
                };
                let Some(&rank) = self.rescaled.get(&(n, c)) else {
                    continue;
                };
                if rank < last {
                    violators.push(self.candidate_ids[n].clone());
                    break;
                }
                last = rank;
            }
        }
        violators
    }

    /// Multi-slot assignments whose consecutive runs do not tile into whole
    /// interviews of length `L(c)`.
    fn contiguity_violations(&self, chosen: &BTreeSet<Triple>) -> Vec<ContiguityViolation> {
        let mut violations = Vec::new();
        for c in 0..self.recruiter_ids.len() {
            let len = self.interview_len[c];
            if len <= 1 {
                continue;
            }
            for &n in &self.active {
                let slots: Vec<usize> = (0..self.slot_ids.len())
                    .filter(|&s| chosen.contains(&(s, c, n)))
                    .collect();
                let mut run = 0u32;
                for (k, &s) in slots.iter().enumerate() {
                    run += 1;
                    let run_ends = k + 1 == slots.len() || slots[k + 1] != s + 1;
                    if run_ends {
                        if run % len != 0 {
                            violations.push(ContiguityViolation {
                                recruiter: self.recruiter_ids[c].clone(),
                                candidate: self.candidate_ids[n].clone(),
                                run_len: run,
                                interview_len: len,
                            });
                        }
                        run = 0;
                    }
                }
            }
        }
        violations
    }

    pub(crate) fn validate_solution(&self, chosen: &BTreeSet<Triple>) -> ValidationReport {
        let preference_violations = if self.has_prefs {
            self.preference_violations(chosen)
        } else {
            Vec::new()
        };
        if !preference_violations.is_empty() {
            warn!(
                "preference order violated for {} candidates: {:?}",
                preference_violations.len(),
                preference_violations
            );
        }

        let contiguity_violations = self.contiguity_violations(chosen);
        for v in &contiguity_violations {
            warn!(
                "candidate {} holds a {}-slot run with {} although interviews take {} slots",
                v.candidate, v.run_len, v.recruiter, v.interview_len
            );
        }

        ValidationReport {
            preference_violations,
            contiguity_violations,
            capacity_warnings: self.capacity_warnings.clone(),
        }
    }
}
