//! Stochastic failure and repair processes for every plant asset.
//!
//! Each physical unit runs an alternating renewal process: an exponential
//! time to failure followed by a repair drawn from its class mixture.
//! Transitions land on a shared event queue ordered by simulation time and
//! are folded into the state vectors as the hourly clock advances.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

use crate::reliability::{AssetClass, ReliabilityTable};
use crate::sim::types::ArchitectureParams;

/// Raw hardware up/down state for every unit in the plant.
///
/// These are physical states only; planned-outage masking is layered on top
/// by the simulation mode.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetStates {
    pub chp: Vec<bool>,
    pub rmu: Vec<bool>,
    pub swbd_a: bool,
    pub swbd_b: bool,
    pub gas_main: bool,
    pub gas_tank: bool,
    pub pv: Vec<bool>,
    pub bess_pcs: Vec<bool>,
    pub bess_string: Vec<bool>,
}

impl AssetStates {
    /// Everything healthy, sized to the architecture.
    pub fn all_up(arch: &ArchitectureParams) -> Self {
        Self {
            chp: vec![true; arch.num_lines],
            rmu: vec![true; arch.num_lines],
            swbd_a: true,
            swbd_b: true,
            gas_main: true,
            gas_tank: true,
            pv: vec![true; arch.pv_blocks],
            bess_pcs: vec![true; arch.bess_pcs_units],
            bess_string: vec![true; arch.bess_string_groups],
        }
    }

    fn set(&mut self, class: AssetClass, index: usize, up: bool) {
        match class {
            AssetClass::ChpEngine => self.chp[index] = up,
            AssetClass::Rmu => self.rmu[index] = up,
            AssetClass::Switchboard => {
                if index == 0 {
                    self.swbd_a = up;
                } else {
                    self.swbd_b = up;
                }
            }
            AssetClass::GasMain => self.gas_main = up,
            AssetClass::GasTank => self.gas_tank = up,
            AssetClass::PvBlock => self.pv[index] = up,
            AssetClass::BessPcs => self.bess_pcs[index] = up,
            AssetClass::BessString => self.bess_string[index] = up,
        }
    }
}

/// A contained sampling fault.
///
/// Degenerate reliability parameters (zero MTBF, empty repair mixture) are
/// recorded here instead of aborting the run; the offending process retries
/// an hour later in its current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessFault {
    pub class: AssetClass,
    pub index: usize,
    pub at_hours: f64,
    pub message: String,
}

/// A pending state change: `unit` becomes `up` at `at_hours`.
#[derive(Debug, Clone)]
struct Transition {
    at_hours: f64,
    seq: u64,
    unit: usize,
    up: bool,
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Transition {}

impl PartialOrd for Transition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Transition {
    // Reversed so the std max-heap pops the earliest transition first; the
    // submission sequence breaks equal-time ties deterministically.
    fn cmp(&self, other: &Self) -> Ordering {
        self.at_hours
            .total_cmp(&other.at_hours)
            .then_with(|| self.seq.cmp(&other.seq))
            .reverse()
    }
}

struct UnitProcess {
    class: AssetClass,
    index: usize,
    rng: StdRng,
}

/// Event-driven renewal processes for the whole plant.
///
/// Every unit owns an RNG stream derived from the master seed and the unit's
/// position in a fixed enumeration order, so a given architecture and seed
/// reproduce the exact same transition history.
pub struct FailureFleet {
    units: Vec<UnitProcess>,
    queue: BinaryHeap<Transition>,
    next_seq: u64,
    table: ReliabilityTable,
    states: AssetStates,
    faults: Vec<ProcessFault>,
}

impl FailureFleet {
    /// Builds one process per unit and schedules each unit's first failure.
    ///
    /// Enumeration order: CHP lines, RMUs, switchboards A and B, gas main,
    /// gas backup tank, PV blocks, BESS PCS units, BESS string groups.
    pub fn new(arch: &ArchitectureParams, table: &ReliabilityTable, master_seed: u64) -> Self {
        let mut fleet = Self {
            units: Vec::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
            table: table.clone(),
            states: AssetStates::all_up(arch),
            faults: Vec::new(),
        };
        for index in 0..arch.num_lines {
            fleet.add_unit(AssetClass::ChpEngine, index, master_seed);
        }
        for index in 0..arch.num_lines {
            fleet.add_unit(AssetClass::Rmu, index, master_seed);
        }
        for index in 0..2 {
            fleet.add_unit(AssetClass::Switchboard, index, master_seed);
        }
        fleet.add_unit(AssetClass::GasMain, 0, master_seed);
        fleet.add_unit(AssetClass::GasTank, 0, master_seed);
        for index in 0..arch.pv_blocks {
            fleet.add_unit(AssetClass::PvBlock, index, master_seed);
        }
        for index in 0..arch.bess_pcs_units {
            fleet.add_unit(AssetClass::BessPcs, index, master_seed);
        }
        for index in 0..arch.bess_string_groups {
            fleet.add_unit(AssetClass::BessString, index, master_seed);
        }
        fleet
    }

    /// Folds every transition due at or before `hour` into the state vectors.
    ///
    /// Follow-on transitions that land inside the same hour are processed
    /// too, so a short repair that fails again immediately is fully resolved
    /// before the caller takes its snapshot.
    pub fn apply_until(&mut self, hour: f64) {
        while self.queue.peek().is_some_and(|t| t.at_hours <= hour) {
            if let Some(transition) = self.queue.pop() {
                self.apply(transition);
            }
        }
    }

    /// Current raw hardware states.
    pub fn states(&self) -> &AssetStates {
        &self.states
    }

    /// Sampling faults recorded so far.
    pub fn faults(&self) -> &[ProcessFault] {
        &self.faults
    }

    fn add_unit(&mut self, class: AssetClass, index: usize, master_seed: u64) {
        let ordinal = self.units.len() as u64;
        let rng = StdRng::seed_from_u64(master_seed.wrapping_add(ordinal));
        self.units.push(UnitProcess { class, index, rng });
        self.schedule_next(self.units.len() - 1, 0.0, true);
    }

    fn apply(&mut self, transition: Transition) {
        let class = self.units[transition.unit].class;
        let index = self.units[transition.unit].index;
        self.states.set(class, index, transition.up);
        self.schedule_next(transition.unit, transition.at_hours, transition.up);
    }

    /// Samples the next dwell for a unit currently `up` at `now` and queues
    /// the resulting transition. A non-finite or non-positive dwell is a
    /// contained fault: the unit keeps its state and retries an hour later.
    fn schedule_next(&mut self, unit: usize, now: f64, up: bool) {
        let class = self.units[unit].class;
        let index = self.units[unit].index;
        let params = self.table.params(class);
        let dwell = if up {
            params.sample_uptime(&mut self.units[unit].rng)
        } else {
            params.sample_repair(&mut self.units[unit].rng)
        };
        if dwell.is_finite() && dwell > 0.0 {
            self.push(now + dwell, unit, !up);
        } else {
            let kind = if up { "uptime" } else { "repair" };
            warn!(
                class = class.name(),
                index,
                kind,
                at_hours = now,
                dwell,
                "degenerate reliability sample; process retries in an hour"
            );
            self.faults.push(ProcessFault {
                class,
                index,
                at_hours: now,
                message: format!("{kind} sample {dwell} is not a positive duration"),
            });
            self.push(now + 1.0, unit, up);
        }
    }

    fn push(&mut self, at_hours: f64, unit: usize, up: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Transition {
            at_hours,
            seq,
            unit,
            up,
        });
    }
}
