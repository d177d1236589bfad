//! Failure and repair statistics for every asset class in the plant.
//!
//! Each class carries a mean time between failures and a repair-duration
//! mixture of weighted uniform ranges. Sampling functions take an explicit
//! RNG handle so that runs are reproducible under a fixed seed.

use rand::{Rng, rngs::StdRng};
use serde::Deserialize;

/// Physical asset classes with independent failure behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    ChpEngine,
    Rmu,
    Switchboard,
    GasMain,
    GasTank,
    PvBlock,
    BessPcs,
    BessString,
}

impl AssetClass {
    /// All classes in the fixed enumeration order used for RNG stream
    /// assignment and fleet construction.
    pub const ALL: [AssetClass; 8] = [
        AssetClass::ChpEngine,
        AssetClass::Rmu,
        AssetClass::Switchboard,
        AssetClass::GasMain,
        AssetClass::GasTank,
        AssetClass::PvBlock,
        AssetClass::BessPcs,
        AssetClass::BessString,
    ];

    /// Stable lowercase name, also used as the configuration key.
    pub fn name(&self) -> &'static str {
        match self {
            AssetClass::ChpEngine => "chp_engine",
            AssetClass::Rmu => "rmu",
            AssetClass::Switchboard => "switchboard",
            AssetClass::GasMain => "gas_main",
            AssetClass::GasTank => "gas_tank",
            AssetClass::PvBlock => "pv_block",
            AssetClass::BessPcs => "bess_pcs",
            AssetClass::BessString => "bess_string",
        }
    }
}

/// One weighted uniform range in a repair-time mixture.
///
/// A point repair duration is expressed as `low_hours == high_hours`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepairBand {
    /// Relative weight of this band within the mixture.
    pub weight: f64,
    /// Lower bound of the repair duration (hours).
    pub low_hours: f64,
    /// Upper bound of the repair duration (hours).
    pub high_hours: f64,
}

impl RepairBand {
    pub fn new(weight: f64, low_hours: f64, high_hours: f64) -> Self {
        Self {
            weight,
            low_hours,
            high_hours,
        }
    }

    /// Midpoint of the range, the band's expected repair duration.
    pub fn mean_hours(&self) -> f64 {
        0.5 * (self.low_hours + self.high_hours)
    }
}

/// MTBF plus repair-duration mixture for one asset class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReliabilityParams {
    /// Mean time between failures (hours).
    pub mtbf_hours: f64,
    /// Weighted uniform ranges making up the repair-time distribution.
    pub repair_bands: Vec<RepairBand>,
}

impl ReliabilityParams {
    pub fn new(mtbf_hours: f64, repair_bands: Vec<RepairBand>) -> Self {
        Self {
            mtbf_hours,
            repair_bands,
        }
    }

    /// Expected repair duration across the mixture (hours).
    pub fn mean_repair_hours(&self) -> f64 {
        let total: f64 = self.repair_bands.iter().map(|b| b.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.repair_bands
            .iter()
            .map(|b| b.weight * b.mean_hours())
            .sum::<f64>()
            / total
    }

    /// Steady-state single-unit availability, `mtbf / (mtbf + E[repair])`.
    pub fn availability(&self) -> f64 {
        let repair = self.mean_repair_hours();
        if self.mtbf_hours <= 0.0 {
            return 0.0;
        }
        self.mtbf_hours / (self.mtbf_hours + repair)
    }

    /// Draws a time-to-failure from the exponential up-time distribution.
    ///
    /// Degenerate parameters (non-positive or non-finite MTBF) produce a
    /// non-finite or negative sample; callers treat that as a contained
    /// process fault rather than panicking.
    pub fn sample_uptime(&self, rng: &mut StdRng) -> f64 {
        let u: f64 = rng.random::<f64>().min(1.0 - 1e-12);
        -self.mtbf_hours * (1.0 - u).ln()
    }

    /// Draws a repair duration from the weighted uniform mixture.
    ///
    /// An empty or zero-weight mixture yields NaN, again handled by the
    /// caller's fault containment.
    pub fn sample_repair(&self, rng: &mut StdRng) -> f64 {
        let total: f64 = self.repair_bands.iter().map(|b| b.weight).sum();
        if total <= 0.0 {
            return f64::NAN;
        }
        let mut pick = rng.random::<f64>() * total;
        for band in &self.repair_bands {
            if pick < band.weight {
                return sample_uniform(rng, band.low_hours, band.high_hours);
            }
            pick -= band.weight;
        }
        // Rounding can leave `pick` a hair above the last cumulative weight.
        let last = self.repair_bands[self.repair_bands.len() - 1];
        sample_uniform(rng, last.low_hours, last.high_hours)
    }
}

fn sample_uniform(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    if high > low {
        low + rng.random::<f64>() * (high - low)
    } else {
        low
    }
}

/// Per-class reliability parameters for the whole plant.
///
/// Field defaults reproduce the reference failure model; any class can be
/// overridden from configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReliabilityTable {
    pub chp_engine: ReliabilityParams,
    pub rmu: ReliabilityParams,
    pub switchboard: ReliabilityParams,
    pub gas_main: ReliabilityParams,
    pub gas_tank: ReliabilityParams,
    pub pv_block: ReliabilityParams,
    pub bess_pcs: ReliabilityParams,
    pub bess_string: ReliabilityParams,
}

impl ReliabilityTable {
    /// Parameters for one asset class.
    pub fn params(&self, class: AssetClass) -> &ReliabilityParams {
        match class {
            AssetClass::ChpEngine => &self.chp_engine,
            AssetClass::Rmu => &self.rmu,
            AssetClass::Switchboard => &self.switchboard,
            AssetClass::GasMain => &self.gas_main,
            AssetClass::GasTank => &self.gas_tank,
            AssetClass::PvBlock => &self.pv_block,
            AssetClass::BessPcs => &self.bess_pcs,
            AssetClass::BessString => &self.bess_string,
        }
    }
}

impl Default for ReliabilityTable {
    fn default() -> Self {
        Self {
            chp_engine: ReliabilityParams::new(
                3000.0,
                vec![
                    RepairBand::new(0.4, 8.0, 24.0),
                    RepairBand::new(0.4, 80.0, 200.0),
                    RepairBand::new(0.2, 300.0, 500.0),
                ],
            ),
            rmu: ReliabilityParams::new(
                10_000.0,
                vec![
                    RepairBand::new(0.5, 0.5, 0.5),
                    RepairBand::new(0.4, 4.0, 4.0),
                    RepairBand::new(0.1, 12.0, 12.0),
                ],
            ),
            switchboard: ReliabilityParams::new(
                20_000.0,
                vec![
                    RepairBand::new(0.4, 1.0, 1.0),
                    RepairBand::new(0.4, 4.0, 4.0),
                    RepairBand::new(0.2, 16.0, 16.0),
                ],
            ),
            gas_main: ReliabilityParams::new(
                8000.0,
                vec![
                    RepairBand::new(0.4, 1.0, 1.0),
                    RepairBand::new(0.4, 4.0, 4.0),
                    RepairBand::new(0.2, 24.0, 24.0),
                ],
            ),
            gas_tank: ReliabilityParams::new(
                20_000.0,
                vec![
                    RepairBand::new(0.5, 0.5, 0.5),
                    RepairBand::new(0.4, 2.0, 2.0),
                    RepairBand::new(0.1, 8.0, 8.0),
                ],
            ),
            pv_block: ReliabilityParams::new(
                30_000.0,
                vec![
                    RepairBand::new(0.5, 4.0, 4.0),
                    RepairBand::new(0.3, 12.0, 12.0),
                    RepairBand::new(0.2, 48.0, 48.0),
                ],
            ),
            bess_pcs: ReliabilityParams::new(
                20_000.0,
                vec![
                    RepairBand::new(0.5, 2.0, 2.0),
                    RepairBand::new(0.3, 6.0, 6.0),
                    RepairBand::new(0.2, 24.0, 24.0),
                ],
            ),
            bess_string: ReliabilityParams::new(
                40_000.0,
                vec![
                    RepairBand::new(0.5, 4.0, 4.0),
                    RepairBand::new(0.3, 24.0, 24.0),
                    RepairBand::new(0.2, 72.0, 72.0),
                ],
            ),
        }
    }
}
