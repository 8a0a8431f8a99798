//! Solver adapter: hands a [`LinearProgram`] to a concrete LP backend.
//!
//! Backends sit behind [`LpSolver`] so the model builder and the report
//! never depend on a particular solver library.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use good_lp::solvers::Solver;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    variable,
};
use serde::{Deserialize, Serialize};

use super::model::{LinearProgram, Sense};
use super::types::SolveStatus;

/// What a backend reports back for one program.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Optimal solution: one value per variable and the objective value the
    /// backend itself reports, in the program's own direction.
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
    /// Backend failure (no convergence, timeout, numerical trouble).
    Error(String),
}

impl SolveOutcome {
    /// Status tag of this outcome.
    pub fn status(&self) -> SolveStatus {
        match self {
            Self::Optimal { .. } => SolveStatus::Optimal,
            Self::Infeasible => SolveStatus::Infeasible,
            Self::Unbounded => SolveStatus::Unbounded,
            Self::Error(msg) => SolveStatus::SolverError(msg.clone()),
        }
    }
}

/// Any LP backend able to solve a bounded, equality-constrained program.
///
/// Implementations pass results through untouched: no retries and no
/// substitute schedules.
pub trait LpSolver {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "lp"
    }
}

impl<S: LpSolver + ?Sized> LpSolver for &S {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        (**self).solve(program)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: LpSolver + ?Sized> LpSolver for Arc<S> {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        (**self).solve(program)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<S: LpSolver + ?Sized> LpSolver for Box<S> {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        (**self).solve(program)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Pure-Rust LP backends available through `good_lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverBackend {
    /// Dense simplex (microlp). Returns vertex solutions.
    #[default]
    Simplex,
    /// Interior-point conic solver (Clarabel).
    InteriorPoint,
}

impl SolverBackend {
    pub const ALL: [Self; 2] = [Self::Simplex, Self::InteriorPoint];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Simplex => "simplex",
            Self::InteriorPoint => "interior-point",
        }
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a backend tag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown solver backend \"{0}\", expected one of: simplex, interior-point")]
pub struct UnknownBackend(pub String);

impl FromStr for SolverBackend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simplex" | "microlp" => Ok(Self::Simplex),
            "interior-point" | "interior_point" | "clarabel" => Ok(Self::InteriorPoint),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// [`LpSolver`] backed by `good_lp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoodLpSolver {
    backend: SolverBackend,
}

impl GoodLpSolver {
    pub fn new(backend: SolverBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> SolverBackend {
        self.backend
    }
}

impl LpSolver for GoodLpSolver {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        match self.backend {
            SolverBackend::Simplex => solve_with(program, good_lp::microlp, |solution| {
                solution.into_inner().objective()
            }),
            // Clarabel always minimizes; a maximized objective comes back negated.
            SolverBackend::InteriorPoint => {
                let direction = match program.sense() {
                    Sense::Maximize => -1.0,
                    Sense::Minimize => 1.0,
                };
                solve_with(program, good_lp::clarabel, move |solution| {
                    direction * solution.inner().obj_val
                })
            }
        }
    }

    fn name(&self) -> &str {
        self.backend.tag()
    }
}

type SolutionOf<S> = <<S as Solver>::Model as SolverModel>::Solution;

fn solve_with<S, F>(program: &LinearProgram, solver: S, native_objective: F) -> SolveOutcome
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError>,
    F: FnOnce(SolutionOf<S>) -> f64,
{
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = program
        .variables()
        .iter()
        .map(|def| {
            vars.add(
                variable()
                    .min(def.lower)
                    .max(def.upper)
                    .name(def.name.clone()),
            )
        })
        .collect();

    let objective = linear_expression(
        program
            .objective()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(i, c)| (handles[i], *c)),
    );

    let unsolved = match program.sense() {
        Sense::Maximize => vars.maximise(objective),
        Sense::Minimize => vars.minimise(objective),
    };

    let model = program
        .constraints()
        .iter()
        .fold(unsolved.using(solver), |model, row| {
            let lhs = linear_expression(row.terms.iter().map(|(v, c)| (handles[v.0], *c)));
            model.with(constraint!(lhs == row.rhs))
        });

    match model.solve() {
        Ok(solution) => {
            let values: Vec<f64> = handles.iter().map(|&h| solution.value(h)).collect();
            let objective = native_objective(solution);
            SolveOutcome::Optimal { values, objective }
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::Infeasible,
        Err(ResolutionError::Unbounded) => SolveOutcome::Unbounded,
        Err(other) => SolveOutcome::Error(other.to_string()),
    }
}

fn linear_expression(terms: impl Iterator<Item = (Variable, f64)>) -> Expression {
    let mut expr = Expression::default();
    for (var, coef) in terms {
        expr += coef * var;
    }
    expr
}

/// Runs an inner solver on a worker thread with a wall-clock limit.
///
/// On timeout the outcome is [`SolveOutcome::Error`]; the worker is left
/// detached and its eventual answer is dropped.
#[derive(Debug, Clone)]
pub struct TimeLimited<S> {
    inner: Arc<S>,
    limit: Duration,
}

impl<S> TimeLimited<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl<S> LpSolver for TimeLimited<S>
where
    S: LpSolver + Send + Sync + 'static,
{
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let program = program.clone();

        let spawned = thread::Builder::new()
            .name("lp-solve".into())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(inner.solve(&program));
            });
        if let Err(e) = spawned {
            return SolveOutcome::Error(format!("failed to spawn solver thread: {e}"));
        }

        match rx.recv_timeout(self.limit) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(solver = self.inner.name(), limit = ?self.limit, "solve timed out");
                SolveOutcome::Error(format!("solver timed out after {:?}", self.limit))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                SolveOutcome::Error("solver thread terminated without a result".into())
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
