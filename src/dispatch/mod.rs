//! Battery dispatch optimization: model builder, solver adapter, report and run driver.

pub mod engine;
pub mod model;
pub mod report;
pub mod solver;
pub mod types;

pub use engine::{Engine, RunStage};
pub use model::{DispatchModel, LinearProgram, VariableLayout};
pub use report::{DispatchReport, Summary};
pub use solver::{GoodLpSolver, LpSolver, SolveOutcome, SolverBackend, TimeLimited};
pub use types::{DispatchSchedule, OptimizationResult, ScheduleRow, SimulationConfig, SolveStatus};
