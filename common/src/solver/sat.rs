use std::collections::HashSet;

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::constraints::{Problem, Relation};

use super::{Feasibility, FeasibilitySolver};

/// Encodes each row as CNF cardinality clauses and runs varisat.
///
/// Rows must have unit coefficients. varisat cannot be interrupted, so the
/// cancellation predicate is only consulted between phases; a solve that
/// finishes after the predicate fires is reported as timed out.
#[derive(Debug, Default, Clone, Copy)]
pub struct SatSolver;

impl FeasibilitySolver for SatSolver {
    fn solve(
        &mut self,
        problem: &Problem,
        cancel: &mut dyn FnMut() -> bool,
    ) -> anyhow::Result<Feasibility> {
        if cancel() {
            return Ok(Feasibility::TimedOut);
        }

        let mut solver = Solver::new();
        let vars: Vec<Var> = (0..problem.variables).map(|_| solver.new_var()).collect();

        let mut formula = CnfFormula::new();
        for constraint in &problem.constraints {
            let mut lits = Vec::with_capacity(constraint.terms.len());
            for &(v, c) in &constraint.terms {
                if c != 1 {
                    anyhow::bail!("sat backend needs unit coefficients: `{constraint}`");
                }
                let var = vars.get(v).ok_or_else(|| {
                    anyhow::anyhow!("constraint `{constraint}` names a variable past {}", vars.len())
                })?;
                lits.push(Lit::from_var(*var, true));
            }

            let len = lits.len() as i64;
            let rhs = constraint.rhs;
            match constraint.relation {
                Relation::Eq if rhs < 0 || rhs > len => formula.add_clause(&[]),
                Relation::Le if rhs < 0 => formula.add_clause(&[]),
                Relation::Ge if rhs > len => formula.add_clause(&[]),
                Relation::Eq => {
                    encode_exactly_k_to_formula(&mut formula, &mut solver, &lits, rhs as usize)
                }
                Relation::Le => encode_at_most_k_to_formula(
                    &mut formula,
                    &mut solver,
                    &lits,
                    rhs.min(len) as usize,
                ),
                Relation::Ge => encode_at_least_k_to_formula(
                    &mut formula,
                    &mut solver,
                    &lits,
                    rhs.max(0) as usize,
                ),
            }
        }

        if cancel() {
            return Ok(Feasibility::TimedOut);
        }
        solver.add_formula(&formula);

        let satisfiable = solver.solve()?;
        if cancel() {
            tracing::debug!("sat result arrived after the deadline");
            return Ok(Feasibility::TimedOut);
        }
        if !satisfiable {
            return Ok(Feasibility::Infeasible);
        }

        let model: HashSet<Lit> = solver
            .model()
            .ok_or_else(|| anyhow::anyhow!("solver_model_fail"))?
            .into_iter()
            .collect();
        let assignment = vars
            .iter()
            .map(|&var| model.contains(&Lit::from_var(var, true)))
            .collect();
        Ok(Feasibility::Feasible(assignment))
    }
}

/// Encodes an "exactly k" constraint into the CNF formula.
fn encode_exactly_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    encode_at_most_k_to_formula(formula, solver, vars, k);
    encode_at_least_k_to_formula(formula, solver, vars, k);
}

/// Encodes an "at most k" constraint into the CNF formula.
fn encode_at_most_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k >= vars.len() {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    if vars.len() <= 10 {
        // Every (k + 1)-subset has a false member.
        for combo in vars.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        // At most k true is at least n - k false.
        let negated: Vec<Lit> = vars.iter().map(|&lit| !lit).collect();
        encode_sequential_counter_at_least_k_to_formula(formula, solver, &negated, vars.len() - k);
    }
}

/// Encodes an "at least k" constraint into the CNF formula.
fn encode_at_least_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k == 0 {
        return;
    }
    if k > vars.len() {
        formula.add_clause(&[]);
        return;
    }

    if vars.len() <= 10 {
        // Every (n - k + 1)-subset has a true member.
        for combo in vars.iter().copied().combinations(vars.len() - k + 1) {
            formula.add_clause(&combo);
        }
    } else {
        encode_sequential_counter_at_least_k_to_formula(formula, solver, vars, k);
    }
}

/// Sequential counter: `s[i][j]` holds iff at least `j + 1` of
/// `vars[..=i]` are true. Requires `1 <= k <= vars.len()`.
fn encode_sequential_counter_at_least_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    let n = vars.len();
    debug_assert!(k >= 1 && k <= n);

    let s: Vec<Vec<Lit>> = (0..n)
        .map(|_| (0..k).map(|_| Lit::from_var(solver.new_var(), true)).collect())
        .collect();

    // s[0][0] iff x[0]; s[0][j] false above that.
    formula.add_clause(&[!vars[0], s[0][0]]);
    formula.add_clause(&[vars[0], !s[0][0]]);
    for &lit in &s[0][1..] {
        formula.add_clause(&[!lit]);
    }

    for i in 1..n {
        let x = vars[i];
        for j in 0..k {
            let here = s[i][j];
            let prev = s[i - 1][j];
            if j == 0 {
                // s[i][0] = s[i-1][0] OR x[i]
                formula.add_clause(&[!here, prev, x]);
                formula.add_clause(&[!prev, here]);
                formula.add_clause(&[!x, here]);
            } else {
                // s[i][j] = s[i-1][j] OR (x[i] AND s[i-1][j-1])
                let prev_lower = s[i - 1][j - 1];
                formula.add_clause(&[!here, prev, x]);
                formula.add_clause(&[!here, prev, prev_lower]);
                formula.add_clause(&[!prev, here]);
                formula.add_clause(&[!x, !prev_lower, here]);
            }
        }
    }

    formula.add_clause(&[s[n - 1][k - 1]]);
}
