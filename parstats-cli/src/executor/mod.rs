//! Strategy Executor
//!
//! Runs the plan and turns its outcomes into output.
//!
//! ```text
//!   Plan (strategy x model)
//!         │
//!         ▼
//!  ┌─────────────┐
//!  │   driver    │  launch → dispatch → join → assemble, one run
//!  └──────┬──────┘
//!         │  StrategyOutcome
//!         ▼
//!  ┌─────────────┐
//!  │ formatting  │  human sections, streamed per run
//!  └─────────────┘
//!  ┌─────────────┐
//!  │   report    │  serializable Report for JSON
//!  └─────────────┘
//! ```
//!
//! Thread workers live in `threads`; process workers in the crate's
//! supervisor module. Both implement [`Launcher`].

mod driver;
mod formatting;
mod report;
mod strategy;
mod threads;

pub use driver::{Driver, RunState, StrategyOutcome, assemble, check_process_payload};
pub use formatting::{format_outcome, section_title};
pub use report::build_report;
pub use strategy::{Plan, PlannedRun, Strategy, WorkerModel};
pub use threads::{Launcher, ThreadLauncher, ThreadWorker, worker_label};
