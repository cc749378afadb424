//! Shared helpers for placement-core integration tests.

use placement_core::models::{ProblemDefinition, ScheduleInput, ScheduleResult, SolverOptions};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Builds an input from slot names, per-recruiter shortlists, per-recruiter
/// panel counts over the slots, interview lengths, and group tuples. The
/// buffer threshold defaults to 0 so every shortlisted candidate is active;
/// tests exercising the buffer override it.
#[allow(dead_code)]
pub fn make_input(
    slots: &[&str],
    shortlists: &[(&str, &[&str])],
    panel_counts: &[(&str, &[u32])],
    interview: &[(&str, u32)],
    groups: &[&[&str]],
) -> ScheduleInput {
    let mut sl = BTreeMap::new();
    for (c, names) in shortlists {
        sl.insert(
            c.to_string(),
            names.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
        );
    }

    let mut panels = BTreeMap::new();
    for (s_idx, s) in slots.iter().enumerate() {
        let mut row = BTreeMap::new();
        for (c, counts) in panel_counts {
            row.insert(c.to_string(), counts[s_idx]);
        }
        panels.insert(s.to_string(), row);
    }

    ScheduleInput {
        problem: ProblemDefinition {
            slots: slots.iter().map(|s| s.to_string()).collect(),
            shortlists: sl,
            panels,
            interview_slots: interview
                .iter()
                .map(|(c, l)| (c.to_string(), *l))
                .collect(),
            panel_groups: groups
                .iter()
                .map(|g| g.iter().map(|c| c.to_string()).collect())
                .collect(),
        },
        prefs: None,
        fixed: vec![],
        left_process: Default::default(),
        skip_initial: Default::default(),
        options: SolverOptions {
            buffer_threshold: 0,
            ..Default::default()
        },
    }
}

#[allow(dead_code)]
pub fn prefs_row(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
    pairs.iter().map(|(c, r)| (c.to_string(), *r)).collect()
}

/// Slots assigned to `candidate`, in temporal order, with the recruiter.
#[allow(dead_code)]
pub fn candidate_slots(result: &ScheduleResult, candidate: &str) -> Vec<(String, String)> {
    result
        .assignments
        .iter()
        .filter(|a| a.candidate == candidate)
        .map(|a| (a.slot.clone(), a.recruiter.clone()))
        .collect()
}

/// Asserts every structural invariant a produced schedule must satisfy:
/// panel capacity, per-slot mutual exclusion, shortlist respect, group
/// throughput, multi-slot contiguity, skip-initial, and buffer disjointness.
#[allow(dead_code)]
pub fn assert_schedule_invariants(input: &ScheduleInput, result: &ScheduleResult) {
    let problem = &input.problem;
    let slot_pos: HashMap<&String, usize> = problem
        .slots
        .iter()
        .enumerate()
        .map(|(i, s)| (s, i))
        .collect();

    // Capacity per (slot, recruiter) cell.
    let mut cell_load: HashMap<(&String, &String), u32> = HashMap::new();
    for a in &result.assignments {
        *cell_load.entry((&a.slot, &a.recruiter)).or_default() += 1;
    }
    for ((slot, recruiter), load) in &cell_load {
        let cap = problem.panels[*slot][*recruiter];
        assert!(
            *load <= cap,
            "cell ({}, {}) holds {} candidates but has {} panels",
            slot,
            recruiter,
            load,
            cap
        );
    }

    // At most one recruiter per (slot, candidate).
    let mut seen: BTreeSet<(&String, &String)> = BTreeSet::new();
    for a in &result.assignments {
        assert!(
            seen.insert((&a.slot, &a.candidate)),
            "candidate {} double-booked in slot {}",
            a.candidate,
            a.slot
        );
    }

    // Shortlist respect.
    for a in &result.assignments {
        assert!(
            problem.shortlists[&a.recruiter].contains(&a.candidate),
            "{} interviews {} without a shortlist",
            a.recruiter,
            a.candidate
        );
    }

    // Recompute the active partition and the per-group targets.
    let mut crit: BTreeMap<&String, u32> = BTreeMap::new();
    for names in problem.shortlists.values() {
        let unique: BTreeSet<&String> = names.iter().collect();
        for n in unique {
            if !input.left_process.contains(n) {
                *crit.entry(n).or_default() += 1;
            }
        }
    }
    let active: BTreeSet<&String> = crit
        .iter()
        .filter(|(_, &k)| k > input.options.buffer_threshold)
        .map(|(&n, _)| n)
        .collect();

    for tuple in &problem.panel_groups {
        let head = &tuple[0];
        let len = problem.interview_slots[head];
        let head_short: BTreeSet<&String> = problem.shortlists[head].iter().collect();
        let comp_sl = head_short.iter().filter(|n| active.contains(*n)).count() as u32;
        let total_panels: u32 = tuple
            .iter()
            .map(|c| problem.slots.iter().map(|s| problem.panels[s][c]).sum::<u32>())
            .sum();
        let target = comp_sl.min(total_panels / len) * len;
        let assigned = result
            .assignments
            .iter()
            .filter(|a| tuple.contains(&a.recruiter))
            .count() as u32;
        assert_eq!(
            assigned, target,
            "group {} filled {} slots, target {}",
            head, assigned, target
        );
    }

    // Contiguity: per recruiter with multi-slot interviews, every candidate's
    // run of consecutive slots tiles into whole interviews.
    for (recruiter, &len) in &problem.interview_slots {
        if len <= 1 {
            continue;
        }
        let mut per_candidate: HashMap<&String, Vec<usize>> = HashMap::new();
        for a in &result.assignments {
            if &a.recruiter == recruiter {
                per_candidate.entry(&a.candidate).or_default().push(slot_pos[&a.slot]);
            }
        }
        for (candidate, mut slots) in per_candidate {
            slots.sort_unstable();
            let mut run = 1u32;
            for k in 1..=slots.len() {
                if k < slots.len() && slots[k] == slots[k - 1] + 1 {
                    run += 1;
                } else {
                    assert_eq!(
                        run % len,
                        0,
                        "candidate {} holds a {}-slot run with {}",
                        candidate,
                        run,
                        recruiter
                    );
                    run = 1;
                }
            }
        }
    }

    // Skip-initial.
    if let Some(first) = problem.slots.first() {
        for a in &result.assignments {
            assert!(
                !(a.slot == *first && input.skip_initial.contains(&a.candidate)),
                "skip-initial candidate {} assigned in the first slot",
                a.candidate
            );
        }
    }

    // Buffer disjointness: buffered candidates never appear in assignments.
    let scheduled: BTreeSet<&String> = result.assignments.iter().map(|a| &a.candidate).collect();
    for row in &result.artifacts.buffer {
        for buffered in &row[1..] {
            assert!(
                !scheduled.contains(buffered),
                "buffered candidate {} was scheduled",
                buffered
            );
        }
    }
}
