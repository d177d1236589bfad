/// Battery energy state, derating, charge and discharge.
pub mod bess;
pub mod diagnostics;
/// Hourly merit-order dispatch.
pub mod dispatch;
pub mod engine;
/// Stochastic failure/repair processes on the shared event queue.
pub mod failure;
pub mod history;
pub mod result;
/// Scheduled-outage overlay and its validated ingestion.
pub mod schedule;
pub mod solar;
pub mod types;
