//! ILP construction and the solver driver.
//!
//! The decision variables are binary `x[s, c, n]` triples meaning "candidate n
//! interviews with recruiter c in slot s". The index set is sparse: a variable
//! exists only when the candidate is active and the recruiter shortlisted them.
//! Materializing the full slot x recruiter x candidate cube would waste memory
//! quadratically in candidate count and visibly slow the solve.

use super::{Instance, ScheduleError, Triple};
use crate::models::ThroughputMode;
use good_lp::{
    constraint, default_solver, variable, variables, Expression, Solution, SolverModel, Variable,
};
use log::{debug, error, info};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

fn sum(vars: Vec<Variable>) -> Expression {
    vars.into_iter().map(Expression::from).sum()
}

impl Instance {
    /// Builds the ILP, runs the MIP backend, and returns the chosen triples.
    ///
    /// Constraint families, in insertion order:
    /// 1. panel capacity per `(slot, recruiter)`;
    /// 2. shortlist gate per `(candidate, group)` — at most `L(head)` slots
    ///    across the group's panels, and only if the head shortlisted them;
    /// 3. mutual exclusion per `(slot, candidate)`;
    /// 4. group throughput (equality by default);
    /// 5. multi-slot contiguity windows;
    /// 6. pre-fixed pins;
    /// 7. first-slot exclusions.
    ///
    /// Families with no matching variables are dropped rather than emitted as
    /// trivial `0 <= 0` rows. A non-optimal resolution status is logged and
    /// returned as [`ScheduleError::Solver`]; callers must not extract
    /// anything from it.
    pub(crate) fn solve_assignment(&self) -> Result<BTreeSet<Triple>, ScheduleError> {
        info!("Creating IPLP");

        let n_slots = self.slot_ids.len();
        let n_recruiters = self.recruiter_ids.len();

        // Sparse variable index set, in deterministic enumeration order:
        // slots in temporal order, recruiters and candidates in sorted-id
        // order.
        let mut triples: Vec<Triple> = Vec::new();
        for s in 0..n_slots {
            for c in 0..n_recruiters {
                for &n in &self.active {
                    if self.shortlist.contains(&(c, n)) {
                        triples.push((s, c, n));
                    }
                }
            }
        }

        let mut vars = variables!();
        let xs: Vec<Variable> = triples
            .iter()
            .map(|_| vars.add(variable().binary()))
            .collect();
        let index: HashMap<Triple, usize> = triples
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, i))
            .collect();

        let objective: Expression = triples
            .iter()
            .zip(&xs)
            .map(|(&t, &x)| self.objective_weight(t) * x)
            .sum();

        let mut model = vars.minimise(objective).using(default_solver);
        let mut n_constraints = 0usize;

        // 1. Panel capacity: cell occupancy is limited by the panel count.
        for s in 0..n_slots {
            for c in 0..n_recruiters {
                let mut cell = Vec::new();
                for &n in &self.active {
                    if let Some(&i) = index.get(&(s, c, n)) {
                        cell.push(xs[i]);
                    }
                }
                if cell.is_empty() {
                    continue;
                }
                let lhs = sum(cell);
                model = model.with(constraint!(lhs <= f64::from(self.panels[s][c])));
                n_constraints += 1;
            }
        }

        // 2. Shortlist gate: across a group's panels a candidate takes at
        // most one interview (L(head) slots), and only if the head
        // shortlisted them.
        for &n in &self.active {
            for members in &self.groups {
                let head = members[0];
                let mut group_vars = Vec::new();
                for s in 0..n_slots {
                    for &c in members {
                        if let Some(&i) = index.get(&(s, c, n)) {
                            group_vars.push(xs[i]);
                        }
                    }
                }
                if group_vars.is_empty() {
                    continue;
                }
                let gate = if self.shortlist.contains(&(head, n)) {
                    f64::from(self.interview_len[head])
                } else {
                    0.0
                };
                let lhs = sum(group_vars);
                model = model.with(constraint!(lhs <= gate));
                n_constraints += 1;
            }
        }

        // 3. Mutual exclusion: a candidate sits on at most one panel per slot.
        for s in 0..n_slots {
            for &n in &self.active {
                let mut row = Vec::new();
                for c in 0..n_recruiters {
                    if let Some(&i) = index.get(&(s, c, n)) {
                        row.push(xs[i]);
                    }
                }
                if row.len() < 2 {
                    continue;
                }
                let lhs = sum(row);
                model = model.with(constraint!(lhs <= 1.0));
                n_constraints += 1;
            }
        }

        // 4. Throughput: each group fills its capacity up to demand.
        for (g, members) in self.groups.iter().enumerate() {
            let mut group_vars = Vec::new();
            for s in 0..n_slots {
                for &c in members {
                    for &n in &self.active {
                        if let Some(&i) = index.get(&(s, c, n)) {
                            group_vars.push(xs[i]);
                        }
                    }
                }
            }
            if group_vars.is_empty() && self.target[g] == 0 {
                continue;
            }
            let rhs = f64::from(self.target[g]);
            let lhs = sum(group_vars);
            model = match self.options.throughput {
                ThroughputMode::Equality => model.with(constraint!(lhs == rhs)),
                ThroughputMode::AtMost => model.with(constraint!(lhs <= rhs)),
            };
            n_constraints += 1;
        }

        // 5. Multi-slot contiguity: partition the slot suffix after the
        // recruiter's first staffed slot into windows of the interview
        // length, and force every variable in a window to the same value.
        for c in 0..n_recruiters {
            let len = self.interview_len[c] as usize;
            if len <= 1 {
                continue;
            }
            let start = match (0..n_slots).find(|&s| self.panels[s][c] > 0) {
                Some(s) => s,
                None => {
                    debug!(
                        "recruiter {} has no staffed slots; skipping contiguity",
                        self.recruiter_ids[c]
                    );
                    continue;
                }
            };
            let mut i = start + len - 1;
            while i < n_slots {
                for &n in &self.active {
                    for j in (i + 1 - len)..i {
                        if let (Some(&vi), Some(&vj)) =
                            (index.get(&(i, c, n)), index.get(&(j, c, n)))
                        {
                            model = model.with(constraint!(xs[vi] - xs[vj] == 0.0));
                            n_constraints += 1;
                        }
                    }
                }
                i += len;
            }
        }

        // 6. Pre-fixed pins.
        for t in &self.fixed {
            if let Some(&i) = index.get(t) {
                model = model.with(constraint!(xs[i] == 1.0));
                n_constraints += 1;
            }
        }

        // 7. Skip-initial: barred candidates never sit in the first slot.
        for &n in &self.skip_initial {
            for c in 0..n_recruiters {
                if let Some(&i) = index.get(&(0, c, n)) {
                    model = model.with(constraint!(xs[i] == 0.0));
                    n_constraints += 1;
                }
            }
        }

        debug!(
            "model has {} binary variables and {} constraints",
            triples.len(),
            n_constraints
        );

        info!("Optimising");
        let started = Instant::now();
        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(status) => {
                error!("solver status: {}", status);
                return Err(status.into());
            }
        };
        info!(
            "optimal solution found in {:.3}s",
            started.elapsed().as_secs_f64()
        );

        let chosen: BTreeSet<Triple> = triples
            .iter()
            .zip(&xs)
            .filter(|(_, &x)| solution.value(x) > 0.5)
            .map(|(&t, _)| t)
            .collect();
        debug!("{} assignments chosen", chosen.len());
        Ok(chosen)
    }
}
