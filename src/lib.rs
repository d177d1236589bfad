//! Reliability and dispatch simulator for a redundant on-site power plant.

pub mod config;
/// CSV export helpers.
pub mod io;
pub mod reliability;
/// Hourly failure, repair, and dispatch simulation modules.
pub mod sim;
pub mod sizing;
