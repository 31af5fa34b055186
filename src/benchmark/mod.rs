//! Evaluation engine
//!
//! A sweep runs in stages, strictly one subprocess at a time:
//!
//! 1. **Compile** (`compiler.rs`): build solvers, generator and verifier.
//! 2. **Generate** (`generator.rs`): produce the planned instances once.
//! 3. **Evaluate** (`runner.rs`): every solver on every instance under a
//!    wall-clock limit (`executor.rs`), checked by the external verifier
//!    (`verifier.rs`) and scored against the exact baseline (`ratio.rs`).
//! 4. **Report** (`report.rs`): console table and `summary.json`.

pub mod compiler;
pub mod executor;
pub mod generator;
pub mod process;
pub mod ratio;
pub mod registry;
pub mod report;
pub mod runner;
pub mod verdict;
pub mod verifier;

pub use compiler::Compiler;
pub use executor::{ExecutionResult, Executor};
pub use generator::InstanceGenerator;
pub use process::{CommandRunner, CommandSpec, Invocation, ProcessRunner};
pub use ratio::{RatioAggregator, RatioSnapshot, SolverStats};
pub use registry::InstanceRegistry;
pub use report::{AttemptRecord, ConsoleReport, RunSummary};
pub use runner::{Evaluation, Harness};
pub use verdict::Verdict;
pub use verifier::Verifier;
