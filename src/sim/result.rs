//! Aggregated outcome of a completed simulation run.

use std::fmt;

use crate::sim::history::HistoryFrame;
use crate::sim::types::{SimConfig, SimMode};

/// Run-level energy totals and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub energy_chp_mwh: f64,
    pub energy_pv_mwh: f64,
    pub energy_bess_mwh: f64,
    pub energy_unserved_mwh: f64,
    pub sim_hours: usize,
    pub des_mode: SimMode,
    pub sim_seed: u64,
}

/// Column-oriented hourly series, one entry per simulated hour.
///
/// `bess_mw` is discharge only; charging shows up as reduced PV surplus, not
/// as negative served power.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeseries {
    pub hour: Vec<usize>,
    pub load_mw: Vec<f64>,
    pub served_mw: Vec<f64>,
    pub pv_mw: Vec<f64>,
    pub bess_mw: Vec<f64>,
    pub chp_mw: Vec<f64>,
    pub unserved_mw: Vec<f64>,
}

impl Timeseries {
    pub fn len(&self) -> usize {
        self.hour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hour.is_empty()
    }

    fn push_frame(&mut self, frame: &HistoryFrame) {
        self.hour.push(frame.hour);
        self.load_mw.push(frame.load_mw);
        self.served_mw.push(frame.served_mw);
        self.pv_mw.push(frame.pv_mw);
        self.bess_mw.push(frame.bess_discharge_mw);
        self.chp_mw.push(frame.chp_mw);
        self.unserved_mw.push(frame.unserved_mw);
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub availability: f64,
    pub outage_hours: usize,
    pub unserved_energy_mwh: f64,
    pub metadata: RunMetadata,
    pub timeseries: Timeseries,
}

impl SimulationResult {
    /// Folds recorded frames into totals in a single pass.
    ///
    /// A run with no hours has no outage hours either, so it reports full
    /// availability.
    pub fn from_run(frames: &[HistoryFrame], outage_hours: usize, config: &SimConfig) -> Self {
        let mut timeseries = Timeseries::default();
        let mut energy_chp_mwh = 0.0;
        let mut energy_pv_mwh = 0.0;
        let mut energy_bess_mwh = 0.0;
        let mut energy_unserved_mwh = 0.0;
        for frame in frames {
            energy_chp_mwh += frame.chp_mw;
            energy_pv_mwh += frame.pv_mw;
            energy_bess_mwh += frame.bess_discharge_mw;
            energy_unserved_mwh += frame.unserved_mw;
            timeseries.push_frame(frame);
        }
        let hours = frames.len();
        let availability = if hours == 0 {
            1.0
        } else {
            1.0 - outage_hours as f64 / hours as f64
        };
        Self {
            availability,
            outage_hours,
            unserved_energy_mwh: energy_unserved_mwh,
            metadata: RunMetadata {
                energy_chp_mwh,
                energy_pv_mwh,
                energy_bess_mwh,
                energy_unserved_mwh,
                sim_hours: hours,
                des_mode: config.mode,
                sim_seed: config.seed,
            },
            timeseries,
        }
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Result ---")?;
        writeln!(f, "hours simulated        : {}", self.metadata.sim_hours)?;
        writeln!(f, "mode                   : {}", self.metadata.des_mode)?;
        writeln!(f, "seed                   : {}", self.metadata.sim_seed)?;
        writeln!(f, "availability           : {:.4} %", self.availability * 100.0)?;
        writeln!(f, "outage hours           : {}", self.outage_hours)?;
        writeln!(
            f,
            "unserved energy        : {:.2} MWh",
            self.unserved_energy_mwh
        )?;
        writeln!(
            f,
            "energy served by chp   : {:.1} MWh",
            self.metadata.energy_chp_mwh
        )?;
        writeln!(
            f,
            "energy served by pv    : {:.1} MWh",
            self.metadata.energy_pv_mwh
        )?;
        write!(
            f,
            "energy served by bess  : {:.1} MWh",
            self.metadata.energy_bess_mwh
        )
    }
}
