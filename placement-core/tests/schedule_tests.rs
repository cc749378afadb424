//! End-to-end scheduling scenarios through `run_scheduler`.

mod common;

use common::{assert_schedule_invariants, candidate_slots, make_input, prefs_row};
use placement_core::models::{FixedAssignment, SolverOptions};
use placement_core::run_scheduler;
use placement_core::solver::ScheduleError;
use std::collections::BTreeMap;

#[test]
fn single_recruiter_fills_early_slots() {
    // Three shortlisted candidates, two slots of one panel: exactly two get
    // interviews and one stays unassigned.
    let input = make_input(
        &["s0", "s1"],
        &[("acme", &["a", "b", "c"])],
        &[("acme", &[1, 1])],
        &[("acme", 1)],
        &[&["acme"]],
    );
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    assert_eq!(result.assignments.len(), 2);
    let slots: Vec<&str> = result.assignments.iter().map(|a| a.slot.as_str()).collect();
    assert_eq!(slots, vec!["s0", "s1"]);
    let mut cands: Vec<&str> = result
        .assignments
        .iter()
        .map(|a| a.candidate.as_str())
        .collect();
    cands.sort_unstable();
    cands.dedup();
    assert_eq!(cands.len(), 2, "one candidate must remain unassigned");
}

#[test]
fn skip_initial_keeps_candidate_out_of_first_slot() {
    let mut input = make_input(
        &["s0", "s1"],
        &[("acme", &["a", "b", "c"])],
        &[("acme", &[1, 1])],
        &[("acme", 1)],
        &[&["acme"]],
    );
    input.skip_initial.insert("a".to_string());
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    for a in &result.assignments {
        if a.slot == "s0" {
            assert_ne!(a.candidate, "a");
        }
    }
    assert_eq!(result.assignments.len(), 2);
}

#[test]
fn multi_slot_interviews_are_contiguous() {
    // Interviews take two slots; with four slots of one panel each both
    // candidates get a full window, (s0, s1) or (s2, s3).
    let input = make_input(
        &["s0", "s1", "s2", "s3"],
        &[("bloom", &["p", "q"])],
        &[("bloom", &[1, 1, 1, 1])],
        &[("bloom", 2)],
        &[&["bloom"]],
    );
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    assert_eq!(result.assignments.len(), 4);
    for candidate in ["p", "q"] {
        let held: Vec<String> = candidate_slots(&result, candidate)
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert!(
            held == ["s0", "s1"] || held == ["s2", "s3"],
            "candidate {} holds {:?}",
            candidate,
            held
        );
    }
    assert!(result.report.contiguity_violations.is_empty());
}

/// The oversubscribed/slack fixture: x runs a single interview while both
/// candidates want it, y has room for everyone.
fn oversubscribed_input() -> placement_core::models::ScheduleInput {
    let mut input = make_input(
        &["s0", "s1"],
        &[("x", &["n1", "n2"]), ("y", &["n1", "n2"])],
        &[("x", &[1, 0]), ("y", &[1, 1])],
        &[("x", 1), ("y", 1)],
        &[&["x"], &["y"]],
    );
    let mut prefs = BTreeMap::new();
    prefs.insert("n1".to_string(), prefs_row(&[("x", 1), ("y", 2)]));
    prefs.insert("n2".to_string(), prefs_row(&[("x", 2), ("y", 1)]));
    input.prefs = Some(prefs);
    input
}

#[test]
fn oversubscribed_recruiter_serves_higher_ranked_candidate_first() {
    let input = oversubscribed_input();
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    // x's single interview goes to n1, who ranked it first.
    let at_x: Vec<(String, String)> = candidate_slots(&result, "n1")
        .into_iter()
        .filter(|(_, c)| c == "x")
        .collect();
    assert_eq!(at_x, vec![("s0".to_string(), "x".to_string())]);

    // Both candidates still complete their y interview.
    assert_eq!(result.assignments.len(), 3);
    assert!(result.report.preference_violations.is_empty());
    assert!(!result.artifacts.prefs_upload.is_empty());

    // The capacity overflow on x is reported, not fatal.
    assert_eq!(result.report.capacity_warnings.len(), 1);
    assert_eq!(result.report.capacity_warnings[0].recruiter, "x");
}

#[test]
fn prefixed_assignment_is_honored() {
    // Two recruiters, two candidates, a perfect 2x2 matching; pinning n1 to
    // x in the second slot forces the whole rotation.
    let mut input = make_input(
        &["s0", "s1"],
        &[("x", &["n1", "n2"]), ("y", &["n1", "n2"])],
        &[("x", &[1, 1]), ("y", &[1, 1])],
        &[("x", 1), ("y", 1)],
        &[&["x"], &["y"]],
    );
    input.fixed.push(FixedAssignment {
        slot: "s1".to_string(),
        recruiter: "x".to_string(),
        candidate: "n1".to_string(),
    });
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    assert!(result
        .assignments
        .iter()
        .any(|a| a.slot == "s1" && a.recruiter == "x" && a.candidate == "n1"));
    assert!(result
        .assignments
        .iter()
        .any(|a| a.slot == "s0" && a.recruiter == "x" && a.candidate == "n2"));
}

#[test]
fn contradictory_pins_are_infeasible() {
    let mut input = make_input(
        &["s0", "s1"],
        &[("acme", &["a", "b", "c"])],
        &[("acme", &[1, 1])],
        &[("acme", 1)],
        &[&["acme"]],
    );
    // Two candidates pinned into a single-panel cell.
    for candidate in ["a", "b"] {
        input.fixed.push(FixedAssignment {
            slot: "s0".to_string(),
            recruiter: "acme".to_string(),
            candidate: candidate.to_string(),
        });
    }
    let err = run_scheduler(&input).unwrap_err();
    assert!(matches!(err, ScheduleError::Solver(_)));
}

#[test]
fn low_shortlist_candidates_go_to_the_buffer() {
    // Under the default threshold, m (three shortlists) is scheduled while b
    // (one shortlist) is held on x's buffer row.
    let mut input = make_input(
        &["s0", "s1", "s2"],
        &[("x", &["m", "b"]), ("y", &["m"]), ("z", &["m"])],
        &[("x", &[1, 1, 1]), ("y", &[1, 1, 1]), ("z", &[1, 1, 1])],
        &[("x", 1), ("y", 1), ("z", 1)],
        &[&["x"], &["y"], &["z"]],
    );
    input.options = SolverOptions::default();
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    // m completes all three interviews.
    assert_eq!(result.assignments.len(), 3);
    assert!(result.assignments.iter().all(|a| a.candidate == "m"));

    let x_row = result
        .artifacts
        .buffer
        .iter()
        .find(|row| row[0] == "x")
        .expect("x has a buffer row");
    assert!(x_row.contains(&"b".to_string()));
    for row in &result.artifacts.buffer {
        if row[0] != "x" {
            assert!(!row.contains(&"b".to_string()));
        }
    }

    // b never shows up in the grid.
    for row in &result.artifacts.grid.rows {
        assert!(row.iter().all(|cell| cell != "b"));
    }
}

#[test]
fn resolving_with_pinned_optimum_is_a_fixed_point() {
    let input = oversubscribed_input();
    let first = run_scheduler(&input).unwrap();

    let mut pinned = input.clone();
    pinned.fixed = first
        .assignments
        .iter()
        .map(|a| FixedAssignment {
            slot: a.slot.clone(),
            recruiter: a.recruiter.clone(),
            candidate: a.candidate.clone(),
        })
        .collect();
    let second = run_scheduler(&pinned).unwrap();

    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.artifacts.grid.rows, second.artifacts.grid.rows);
}

#[test]
fn grid_and_names_artifacts_have_expected_shape() {
    let input = oversubscribed_input();
    let result = run_scheduler(&input).unwrap();

    // Header: Slot, then one column per panel; x and y both have one panel.
    assert_eq!(
        result.artifacts.grid.header,
        vec!["Slot", "x1", "y1"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
    assert_eq!(result.artifacts.grid.rows.len(), 2);
    // Cells carry the rank_crit annotation in preference mode.
    assert_eq!(result.artifacts.grid.rows[0][1], "n1 1_2");

    assert_eq!(
        result.artifacts.names.header,
        vec!["Slot", "n1", "n2"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
    let names_row0 = &result.artifacts.names.rows[0];
    assert_eq!(names_row0[0], "s0");
    assert_eq!(names_row0[1], "x");
}

#[test]
fn static_upload_reports_group_head_and_panel_position() {
    // Two parallel panels of x; only the second one is staffed in the first
    // slot, so the upload row points at panel 2 of x.
    let input = make_input(
        &["s0"],
        &[("x", &["p"]), ("x2", &["p"])],
        &[("x", &[0]), ("x2", &[1])],
        &[("x", 1), ("x2", 1)],
        &[&["x", "x2"]],
    );
    let result = run_scheduler(&input).unwrap();
    assert_schedule_invariants(&input, &result);

    assert_eq!(result.artifacts.static_upload.len(), 1);
    let row = &result.artifacts.static_upload[0];
    assert_eq!(row.name, "p");
    assert_eq!(row.company, "x");
    assert_eq!(row.round, 1);
    assert_eq!(row.panel, 2);
}

#[test]
fn schedule_input_round_trips_through_json() {
    let input = oversubscribed_input();
    let json = serde_json::to_string(&input).unwrap();
    let back: placement_core::models::ScheduleInput = serde_json::from_str(&json).unwrap();
    let a = run_scheduler(&input).unwrap();
    let b = run_scheduler(&back).unwrap();
    assert_eq!(a.assignments, b.assignments);
}
