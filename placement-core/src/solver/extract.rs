//! Decomposition of the solved assignment set into the output artifacts.
//!
//! Everything here walks indices in the same deterministic order the model was
//! built in, so two runs over the same optimum produce byte-identical tables.

use super::{Instance, Triple};
use crate::models::{Assignment, ScheduleArtifacts, StaticUploadRow, Table};
use std::collections::BTreeSet;

impl Instance {
    /// Cell text for one assignment. In preference mode candidates are
    /// annotated with their dense rank and shortlist count, `name rank_crit`.
    fn candidate_cell(&self, c: usize, n: usize) -> String {
        if self.has_prefs {
            let rank = self.rescaled.get(&(n, c)).copied().unwrap_or(0);
            format!("{} {}_{}", self.candidate_ids[n], rank, self.crit[n])
        } else {
            self.candidate_ids[n].clone()
        }
    }

    /// The slot x recruiter-panel grid (`sche`).
    ///
    /// One column per panel of each recruiter, `<recruiter>1..<recruiter>K`
    /// with `K = max_panels`. Within a slot a recruiter's assignees fill its
    /// panel columns left to right in candidate order; the panels are
    /// interchangeable so no further tie-break applies.
    fn extract_grid(&self, chosen: &BTreeSet<Triple>) -> Table {
        let mut header = vec!["Slot".to_string()];
        for (c, id) in self.recruiter_ids.iter().enumerate() {
            for j in 0..self.max_panels[c] {
                header.push(format!("{}{}", id, j + 1));
            }
        }

        let mut rows = Vec::with_capacity(self.slot_ids.len());
        for (s, slot) in self.slot_ids.iter().enumerate() {
            let mut row = vec![slot.clone()];
            for c in 0..self.recruiter_ids.len() {
                let mut cells = vec![String::new(); self.max_panels[c] as usize];
                let mut filled = 0usize;
                for &n in &self.active {
                    if chosen.contains(&(s, c, n)) {
                        if let Some(cell) = cells.get_mut(filled) {
                            *cell = self.candidate_cell(c, n);
                        }
                        filled += 1;
                    }
                }
                row.append(&mut cells);
            }
            rows.push(row);
        }
        Table { header, rows }
    }

    /// The slot x candidate table (`names`): which recruiter, if any, each
    /// active candidate sees in each slot.
    fn extract_names(&self, chosen: &BTreeSet<Triple>) -> Table {
        let mut header = vec!["Slot".to_string()];
        for &n in &self.active {
            header.push(self.candidate_ids[n].clone());
        }

        let mut rows = Vec::with_capacity(self.slot_ids.len());
        for (s, slot) in self.slot_ids.iter().enumerate() {
            let mut row = vec![slot.clone()];
            for &n in &self.active {
                row.push(match self.assigned_recruiter(chosen, s, n) {
                    Some(c) => self.recruiter_ids[c].clone(),
                    None => String::new(),
                });
            }
            rows.push(row);
        }
        Table { header, rows }
    }

    /// The buffer list (`buff`): per group, the head followed by every
    /// buffered candidate the head shortlisted. These candidates are not
    /// scheduled; they are held ready.
    fn extract_buffer(&self) -> Vec<Vec<String>> {
        self.groups
            .iter()
            .map(|members| {
                let head = members[0];
                let mut row = vec![self.recruiter_ids[head].clone()];
                for &n in &self.buffer {
                    if self.shortlist.contains(&(head, n)) {
                        row.push(self.candidate_ids[n].clone());
                    }
                }
                row
            })
            .collect()
    }

    /// The first-slot fanout (`staticupload`): one row per candidate
    /// interviewing in the first slot, keyed by the group head with the
    /// 1-based panel position of the assigned member.
    fn extract_static_upload(&self, chosen: &BTreeSet<Triple>) -> Vec<StaticUploadRow> {
        let mut rows = Vec::new();
        for members in &self.groups {
            let head = members[0];
            for (pos, &c) in members.iter().enumerate() {
                for &n in &self.active {
                    if chosen.contains(&(0, c, n)) {
                        rows.push(StaticUploadRow {
                            name: self.candidate_ids[n].clone(),
                            company: self.recruiter_ids[head].clone(),
                            round: 1,
                            panel: pos as u32 + 1,
                        });
                    }
                }
            }
        }
        rows.sort_by(|a, b| (&a.company, a.panel, &a.name).cmp(&(&b.company, b.panel, &b.name)));
        rows
    }

    pub(crate) fn extract_artifacts(&self, chosen: &BTreeSet<Triple>) -> ScheduleArtifacts {
        ScheduleArtifacts {
            grid: self.extract_grid(chosen),
            names: self.extract_names(chosen),
            buffer: self.extract_buffer(),
            static_upload: self.extract_static_upload(chosen),
            prefs_upload: self.prefs_upload_rows(),
        }
    }

    /// The chosen triples as string assignments, ordered by slot position,
    /// then recruiter and candidate identifier.
    pub(crate) fn extract_assignments(&self, chosen: &BTreeSet<Triple>) -> Vec<Assignment> {
        let mut out: Vec<Assignment> = chosen
            .iter()
            .map(|&(s, c, n)| Assignment {
                slot: self.slot_ids[s].clone(),
                recruiter: self.recruiter_ids[c].clone(),
                candidate: self.candidate_ids[n].clone(),
            })
            .collect();
        out.sort_by(|a, b| {
            (self.slot_idx[&a.slot], &a.recruiter, &a.candidate).cmp(&(
                self.slot_idx[&b.slot],
                &b.recruiter,
                &b.candidate,
            ))
        });
        out
    }
}
