//! Shared test fixtures for integration tests.

use plant_sim::reliability::{ReliabilityParams, ReliabilityTable, RepairBand};
use plant_sim::sim::schedule::{OutageAsset, OutageKind, ScheduledOutageEvent};
use plant_sim::sim::types::{ArchitectureParams, SimConfig, SimMode};

/// Reference plant (20 x 2.5 MW lines guaranteeing 45 MW, 64 MW PV,
/// 15 MW / 60 MWh BESS).
pub fn reference_arch() -> ArchitectureParams {
    ArchitectureParams::default()
}

/// One simulated week in random mode at the given seed.
pub fn week_config(seed: u64) -> SimConfig {
    SimConfig::new(168, seed, SimMode::Random)
}

/// Reliability params that keep a unit up for any practical run length.
pub fn pinned_up() -> ReliabilityParams {
    ReliabilityParams::new(1e15, vec![RepairBand::new(1.0, 1.0, 1.0)])
}

/// Default table with switchboards and gas supply pinned up.
///
/// Those classes keep their raw stochastic state in every mode, so tests
/// asserting exact outage counts need them effectively immortal.
pub fn calm_infrastructure() -> ReliabilityTable {
    ReliabilityTable {
        switchboard: pinned_up(),
        gas_main: pinned_up(),
        gas_tank: pinned_up(),
        ..ReliabilityTable::default()
    }
}

/// Table with every class pinned up; only scheduled outages move state.
pub fn immortal_table() -> ReliabilityTable {
    ReliabilityTable {
        chp_engine: pinned_up(),
        rmu: pinned_up(),
        switchboard: pinned_up(),
        gas_main: pinned_up(),
        gas_tank: pinned_up(),
        pv_block: pinned_up(),
        bess_pcs: pinned_up(),
        bess_string: pinned_up(),
    }
}

/// Table for year-long runs: engines fail every 3000 h with day-long
/// repairs, switchboards flap hourly. Outages occur in essentially every
/// year without ever dominating it.
pub fn annual_benchmark_table() -> ReliabilityTable {
    ReliabilityTable {
        chp_engine: ReliabilityParams::new(3000.0, vec![RepairBand::new(1.0, 24.0, 24.0)]),
        switchboard: ReliabilityParams::new(22.0, vec![RepairBand::new(1.0, 1.0, 1.0)]),
        ..ReliabilityTable::default()
    }
}

/// Planned maintenance window for the 1-based CHP line index.
pub fn chp_window(index: usize, start: u64, duration: u64) -> ScheduledOutageEvent {
    ScheduledOutageEvent::new(
        OutageAsset::Chp,
        index,
        start,
        duration,
        OutageKind::PlannedMaintenance,
    )
}
