use std::fmt;

use crate::grid::Grid;
use crate::partition::Partition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

/// `sum(coefficient * x[variable]) <relation> rhs` over 0/1 variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub terms: Vec<(usize, i64)>,
    pub relation: Relation,
    pub rhs: i64,
}

impl LinearConstraint {
    /// All coefficients one: the number of mines among `variables`.
    pub fn count(variables: impl IntoIterator<Item = usize>, relation: Relation, rhs: i64) -> Self {
        LinearConstraint {
            terms: variables.into_iter().map(|v| (v, 1)).collect(),
            relation,
            rhs,
        }
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        let lhs: i64 = self
            .terms
            .iter()
            .filter(|&&(v, _)| assignment[v])
            .map(|&(_, c)| c)
            .sum();
        match self.relation {
            Relation::Eq => lhs == self.rhs,
            Relation::Le => lhs <= self.rhs,
            Relation::Ge => lhs >= self.rhs,
        }
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (v, c)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if *c == 1 {
                write!(f, "x_{v}")?;
            } else {
                write!(f, "{c}*x_{v}")?;
            }
        }
        if self.terms.is_empty() {
            write!(f, "0")?;
        }
        let op = match self.relation {
            Relation::Eq => "=",
            Relation::Le => "<=",
            Relation::Ge => ">=",
        };
        write!(f, " {op} {}", self.rhs)
    }
}

/// A binary feasibility problem: find `x` in {0,1}^variables meeting every
/// constraint.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    pub variables: usize,
    pub constraints: Vec<LinearConstraint>,
}

impl Problem {
    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        assignment.len() == self.variables
            && self.constraints.iter().all(|c| c.is_satisfied_by(assignment))
    }
}

/// The caller's demand on a shallow cell: variable and wanted value.
#[derive(Debug, Clone, Copy)]
pub struct Pin {
    pub variable: usize,
    pub mine: bool,
}

/// Builds the mine placement problem over the shallow cells.
///
/// One equality per revealed number over its hidden neighbors, then the
/// two bounds on the total number of shallow mines: at least
/// `total_mines - deep_cells` (the deep region holds at most one mine per
/// cell) and at most `total_mines`. A pinned cell adds one final equality.
///
/// `total_mines` and `deep_cells` are passed in rather than read off the
/// partition because a deep clicked cell is taken out of the pool.
pub fn encode(
    grid: &Grid,
    partition: &Partition,
    total_mines: usize,
    deep_cells: usize,
    pin: Option<Pin>,
) -> Problem {
    let n = partition.shallow.len();
    let mut constraints = Vec::with_capacity(partition.sources.len() + 3);

    for &source in &partition.sources {
        let variables = grid.neighbors(source).filter_map(|neighbor| {
            if grid.cell(neighbor).is_hidden() {
                let variable = partition.variable(neighbor);
                assert!(variable.is_some(), "hidden neighbor of {source:?} is not shallow");
                variable
            } else {
                None
            }
        });
        let constraint = LinearConstraint::count(
            variables,
            Relation::Eq,
            i64::from(grid.cell(source).adjacent_mines),
        );
        tracing::trace!(%constraint, "revealed number at ({}, {})", source.x, source.y);
        constraints.push(constraint);
    }

    let total = total_mines as i64;
    constraints.push(LinearConstraint::count(0..n, Relation::Ge, total - deep_cells as i64));
    constraints.push(LinearConstraint::count(0..n, Relation::Le, total));

    if let Some(pin) = pin {
        constraints.push(LinearConstraint::count(
            [pin.variable],
            Relation::Eq,
            i64::from(pin.mine),
        ));
    }

    Problem {
        variables: n,
        constraints,
    }
}
