//! Core simulation types: run configuration and plant architecture.

use std::fmt;

use crate::sim::schedule::Schedule;
use crate::sizing::GensetDesign;

/// How stochastic failures and the maintenance schedule combine per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimMode {
    /// Stochastic failures only; the schedule is ignored.
    #[default]
    Random,
    /// Stochastic failures plus scheduled outages forcing assets down.
    Hybrid,
    /// Scheduled outages only; stochastic failures are ignored.
    Schedule,
}

impl SimMode {
    /// Parses the configuration spelling of a mode.
    pub fn parse(s: &str) -> Option<SimMode> {
        match s {
            "random" => Some(SimMode::Random),
            "hybrid" => Some(SimMode::Hybrid),
            "schedule" => Some(SimMode::Schedule),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimMode::Random => "random",
            SimMode::Hybrid => "hybrid",
            SimMode::Schedule => "schedule",
        }
    }

    /// Resolves a unit's effective availability for one hour from its raw
    /// stochastic state and whether a scheduled outage covers it.
    pub fn effective_up(&self, raw_up: bool, scheduled_out: bool) -> bool {
        match self {
            SimMode::Random => raw_up,
            SimMode::Hybrid => raw_up && !scheduled_out,
            SimMode::Schedule => !scheduled_out,
        }
    }
}

impl fmt::Display for SimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run parameters for one simulation.
///
/// # Examples
///
/// ```
/// use plant_sim::sim::types::{SimConfig, SimMode};
///
/// let cfg = SimConfig::new(168, 42, SimMode::Random);
/// assert_eq!(cfg.hours, 168);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of hourly steps to simulate (must be > 0).
    pub hours: usize,
    /// Master random seed; every unit derives its own stream from it.
    pub seed: u64,
    /// Failure/schedule combination mode.
    pub mode: SimMode,
    /// Planned outages, consulted in `hybrid` and `schedule` modes.
    pub schedule: Schedule,
}

impl SimConfig {
    /// Creates a run configuration with an empty outage schedule.
    ///
    /// # Panics
    ///
    /// Panics if `hours` is zero.
    pub fn new(hours: usize, seed: u64, mode: SimMode) -> Self {
        assert!(hours > 0, "hours must be > 0");
        Self {
            hours,
            seed,
            mode,
            schedule: Schedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }
}

impl Default for SimConfig {
    /// One week at seed 42 with stochastic failures only.
    fn default() -> Self {
        SimConfig::new(168, 42, SimMode::Random)
    }
}

/// Physical layout of the plant fed to the hourly simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchitectureParams {
    /// Installed CHP generation lines (engine + RMU pairs).
    pub num_lines: usize,
    /// Nameplate rating of one line (MW).
    pub line_rating_mw: f64,
    /// Firm capacity the plant guarantees to the datacenter (MW).
    pub guaranteed_mw: f64,
    /// Constant datacenter load (MW).
    pub load_mw: f64,
    /// Independently failing PV blocks.
    pub pv_blocks: usize,
    /// Nameplate rating of one PV block (MW).
    pub pv_block_rating_mw: f64,
    /// BESS power rating (MW).
    pub bess_power_mw: f64,
    /// BESS energy rating (MWh).
    pub bess_energy_mwh: f64,
    /// Power conversion units; each failure derates power pro rata.
    pub bess_pcs_units: usize,
    /// Battery string groups; each failure derates energy pro rata.
    pub bess_string_groups: usize,
    /// Starting state of charge as a fraction of energy rating.
    pub bess_initial_soc: f64,
    /// Display idle CHP lines at 10% of rating when PV and BESS already
    /// cover the load. Presentation only; never counted as served energy.
    pub idle_chp_display: bool,
}

impl ArchitectureParams {
    /// Lines that must be up for the plant to meet its guarantee.
    pub fn min_lines_required(&self) -> usize {
        let rating = self.line_rating_mw.max(1e-9);
        ((self.guaranteed_mw / rating).round() as usize).max(1)
    }

    /// Total PV nameplate across all blocks (MW).
    pub fn pv_total_mw(&self) -> f64 {
        self.pv_blocks as f64 * self.pv_block_rating_mw
    }

    /// Derives a simulation architecture from a sized genset design plus
    /// site-level PV and storage totals.
    ///
    /// PV is split into roughly 5 MW blocks, PCS units into roughly 1 MW
    /// converters, and string groups into roughly 5 MWh groups, so that the
    /// failure model has realistic granularity regardless of totals.
    pub fn from_design(
        design: &GensetDesign,
        pv_total_mw: f64,
        bess_power_mw: f64,
        bess_energy_mwh: f64,
        load_mw: f64,
    ) -> Self {
        let line_rating_mw = design.per_unit_mw.max(0.1);
        let pv_blocks = if pv_total_mw > 0.0 {
            ((pv_total_mw / 5.0).round() as usize).max(1)
        } else {
            0
        };
        let pv_block_rating_mw = if pv_blocks > 0 {
            pv_total_mw / pv_blocks as f64
        } else {
            0.0
        };
        let bess_pcs_units = if bess_power_mw > 0.0 {
            (bess_power_mw.round() as usize).max(1)
        } else {
            0
        };
        let bess_string_groups = if bess_energy_mwh > 0.0 {
            ((bess_energy_mwh / 5.0).round() as usize).max(1)
        } else {
            0
        };
        Self {
            num_lines: design.installed_units.max(1),
            line_rating_mw,
            guaranteed_mw: design.required_units as f64 * line_rating_mw,
            load_mw,
            pv_blocks,
            pv_block_rating_mw,
            bess_power_mw,
            bess_energy_mwh,
            bess_pcs_units,
            bess_string_groups,
            bess_initial_soc: 0.5,
            idle_chp_display: false,
        }
    }
}

impl Default for ArchitectureParams {
    /// Reference plant: 20 x 2.5 MW lines guaranteeing 45 MW, 8 x 8 MW PV
    /// blocks, and a 15 MW / 60 MWh BESS split over 3 PCS and 3 strings.
    fn default() -> Self {
        Self {
            num_lines: 20,
            line_rating_mw: 2.5,
            guaranteed_mw: 45.0,
            load_mw: 45.0,
            pv_blocks: 8,
            pv_block_rating_mw: 8.0,
            bess_power_mw: 15.0,
            bess_energy_mwh: 60.0,
            bess_pcs_units: 3,
            bess_string_groups: 3,
            bess_initial_soc: 0.5,
            idle_chp_display: false,
        }
    }
}
