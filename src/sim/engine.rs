//! Simulation controller that owns the clock, failure processes, storage
//! state, and recorded history for one run.

use crate::reliability::ReliabilityTable;
use crate::sim::bess::BessState;
use crate::sim::diagnostics::Diagnostics;
use crate::sim::dispatch::dispatch_hour;
use crate::sim::failure::{FailureFleet, ProcessFault};
use crate::sim::history::{ChpLineFrame, HistoryFrame, HistoryStore, PvBlockFrame};
use crate::sim::result::SimulationResult;
use crate::sim::schedule::OutageAsset;
use crate::sim::solar::irradiance_fraction;
use crate::sim::types::{ArchitectureParams, SimConfig, SimMode};

/// Shortfalls below this are float noise, not an outage.
pub const UNSERVED_TOLERANCE_MW: f64 = 1e-6;

/// One simulation run: plant layout, run configuration, stochastic failure
/// processes, battery energy state, and the frames recorded so far.
///
/// All state is owned here, so independent runs can coexist and a `reset()`
/// replays the exact same history for the same seed.
pub struct Simulation {
    arch: ArchitectureParams,
    config: SimConfig,
    table: ReliabilityTable,
    fleet: FailureFleet,
    bess: BessState,
    history: HistoryStore,
    hour: usize,
    outage_hours: usize,
    hours_below_load: usize,
}

impl Simulation {
    pub fn new(arch: ArchitectureParams, config: SimConfig, table: ReliabilityTable) -> Self {
        let fleet = FailureFleet::new(&arch, &table, config.seed);
        let bess = BessState::new(&arch);
        Self {
            arch,
            config,
            table,
            fleet,
            bess,
            history: HistoryStore::new(),
            hour: 0,
            outage_hours: 0,
            hours_below_load: 0,
        }
    }

    /// Discards all progress and reseeds the failure processes, so the next
    /// steps replay the same history.
    pub fn reset(&mut self) {
        self.fleet = FailureFleet::new(&self.arch, &self.table, self.config.seed);
        self.bess = BessState::new(&self.arch);
        self.history = HistoryStore::new();
        self.hour = 0;
        self.outage_hours = 0;
        self.hours_below_load = 0;
    }

    /// Simulates one hour and returns its frame.
    pub fn step(&mut self) -> &HistoryFrame {
        let hour = self.hour;
        let hour_u64 = hour as u64;

        // 1. Fold in every failure/repair transition due by this hour.
        self.fleet.apply_until(hour as f64);
        let raw = self.fleet.states().clone();

        // 2. Resolve effective availability. The mode masks raw state with
        //    the schedule for CHP, PV, and BESS; switchboards, gas supply,
        //    and RMUs are never scheduled and stay raw.
        let mode = self.config.mode;
        let schedule = &self.config.schedule;
        let chp_eff: Vec<bool> = raw
            .chp
            .iter()
            .enumerate()
            .map(|(i, up)| {
                mode.effective_up(*up, schedule.is_outage(OutageAsset::Chp, i + 1, hour_u64))
            })
            .collect();
        let pv_eff: Vec<bool> = raw
            .pv
            .iter()
            .enumerate()
            .map(|(i, up)| {
                mode.effective_up(*up, schedule.is_outage(OutageAsset::Pv, i + 1, hour_u64))
            })
            .collect();
        let bess_scheduled_out =
            mode != SimMode::Random && schedule.is_outage(OutageAsset::Bess, 1, hour_u64);
        let (pcs_up, strings_up) = if bess_scheduled_out {
            (0, 0)
        } else if mode == SimMode::Schedule {
            (self.arch.bess_pcs_units, self.arch.bess_string_groups)
        } else {
            (count_up(&raw.bess_pcs), count_up(&raw.bess_string))
        };

        // 3. Derate storage by surviving PCS units and string groups.
        let limits = self.bess.derate(pcs_up, strings_up);

        // 4. Daylight PV availability.
        let pv_blocks_up = count_up(&pv_eff);
        let pv_available_mw =
            pv_blocks_up as f64 * self.arch.pv_block_rating_mw * irradiance_fraction(hour_u64);

        // 5. Merit-order dispatch.
        let load = self.arch.load_mw;
        let dispatch = dispatch_hour(
            load,
            &chp_eff,
            self.arch.line_rating_mw,
            pv_available_mw,
            &mut self.bess,
            limits,
            self.arch.idle_chp_display,
        );

        // 6. Structural redundancy check and service counters.
        let online_lines = count_up(&chp_eff);
        let path_ok = (raw.swbd_a || raw.swbd_b)
            && (raw.gas_main || raw.gas_tank)
            && online_lines >= self.arch.min_lines_required();
        let outage = !path_ok || dispatch.unserved_mw > UNSERVED_TOLERANCE_MW;
        let underpowered = dispatch.served_mw < load - UNSERVED_TOLERANCE_MW;
        if outage {
            self.outage_hours += 1;
        }
        if underpowered {
            self.hours_below_load += 1;
        }

        // 7. Record the frame.
        let chp_lines = chp_eff
            .iter()
            .enumerate()
            .map(|(i, up)| ChpLineFrame {
                id: i + 1,
                online: *up,
                mw: dispatch.per_line_mw[i],
            })
            .collect();
        // Served PV is split evenly across producing blocks for display.
        let pv_block_share = if pv_blocks_up > 0 {
            dispatch.pv_mw / pv_blocks_up as f64
        } else {
            0.0
        };
        let pv_blocks = pv_eff
            .iter()
            .enumerate()
            .map(|(i, up)| PvBlockFrame {
                id: i + 1,
                online: *up,
                mw: if *up { pv_block_share } else { 0.0 },
            })
            .collect();
        self.history.push(HistoryFrame {
            hour,
            load_mw: load,
            served_mw: dispatch.served_mw,
            unserved_mw: dispatch.unserved_mw,
            online_lines,
            chp_mw: dispatch.chp_mw,
            pv_mw: dispatch.pv_mw,
            bess_discharge_mw: dispatch.bess_discharge_mw,
            bess_charge_mw: dispatch.bess_charge_mw,
            bess_soc_mwh: self.bess.soc_mwh(),
            bess_soc_pct: self.bess.soc_fraction() * 100.0,
            chp_lines,
            pv_blocks,
            rmu_up: count_up(&raw.rmu),
            pcs_up,
            strings_up,
            swbd_a_up: raw.swbd_a,
            swbd_b_up: raw.swbd_b,
            gas_main_up: raw.gas_main,
            gas_tank_up: raw.gas_tank,
            path_ok,
            underpowered,
            outage,
        });
        self.hour += 1;
        &self.history.frames()[hour]
    }

    /// Advances `n` hours and returns the last recorded frame, `None` if the
    /// simulation has never stepped.
    pub fn fast_forward(&mut self, n: usize) -> Option<&HistoryFrame> {
        for _ in 0..n {
            self.step();
        }
        self.history.last()
    }

    /// Steps through any remaining hours and aggregates the run.
    pub fn run(&mut self) -> SimulationResult {
        while self.hour < self.config.hours {
            self.step();
        }
        SimulationResult::from_run(self.history.frames(), self.outage_hours, &self.config)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn frames(&self) -> &[HistoryFrame] {
        self.history.frames()
    }

    /// Aggregate statistics over the last `window` hours (all hours when
    /// `None`); `None` until at least one hour has been simulated.
    pub fn diagnostics(&self, window: Option<usize>) -> Option<Diagnostics> {
        Diagnostics::compute(
            self.history.frames(),
            &self.arch,
            self.outage_hours,
            self.hours_below_load,
            window,
        )
    }

    /// Contained sampling faults recorded by the failure processes.
    pub fn faults(&self) -> &[ProcessFault] {
        self.fleet.faults()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn architecture(&self) -> &ArchitectureParams {
        &self.arch
    }

    pub fn outage_hours(&self) -> usize {
        self.outage_hours
    }

    pub fn hours_below_load(&self) -> usize {
        self.hours_below_load
    }
}

/// Builds a simulation, runs it to completion, and returns the result.
pub fn run_simulation(
    arch: ArchitectureParams,
    config: SimConfig,
    table: ReliabilityTable,
) -> SimulationResult {
    let mut sim = Simulation::new(arch, config, table);
    sim.run()
}

fn count_up(flags: &[bool]) -> usize {
    flags.iter().filter(|up| **up).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::{ReliabilityParams, RepairBand};
    use crate::sim::schedule::{OutageKind, Schedule, ScheduledOutageEvent};

    fn chp_event(index: usize, start: u64, duration: u64) -> ScheduledOutageEvent {
        ScheduledOutageEvent::new(
            OutageAsset::Chp,
            index,
            start,
            duration,
            OutageKind::PlannedMaintenance,
        )
    }

    /// Switchboards and gas keep their raw stochastic state in every mode,
    /// so tests asserting exact outage counts pin them effectively immortal.
    fn calm_infrastructure() -> ReliabilityTable {
        let calm = ReliabilityParams::new(1e15, vec![RepairBand::new(1.0, 1.0, 1.0)]);
        ReliabilityTable {
            switchboard: calm.clone(),
            gas_main: calm.clone(),
            gas_tank: calm,
            ..ReliabilityTable::default()
        }
    }

    #[test]
    fn schedule_mode_with_empty_schedule_serves_fully() {
        let config = SimConfig::new(168, 42, SimMode::Schedule);
        let mut sim = Simulation::new(
            ArchitectureParams::default(),
            config,
            calm_infrastructure(),
        );
        let result = sim.run();
        assert_eq!(result.availability, 1.0);
        assert_eq!(result.outage_hours, 0);
        assert_eq!(result.metadata.sim_hours, 168);
        for frame in sim.frames() {
            assert!(frame.path_ok);
            assert!((frame.served_mw - 45.0).abs() < 1e-9);
        }
    }

    #[test]
    fn scheduled_chp_outage_forces_line_down() {
        let schedule = Schedule::from_events(vec![chp_event(1, 10, 5)]);
        let config = SimConfig::new(20, 42, SimMode::Schedule).with_schedule(schedule);
        let mut sim = Simulation::new(
            ArchitectureParams::default(),
            config,
            calm_infrastructure(),
        );
        let result = sim.run();
        for frame in sim.frames() {
            let line0 = &frame.chp_lines[0];
            if (10..15).contains(&frame.hour) {
                assert!(!line0.online, "hour {} should be out", frame.hour);
                assert_eq!(line0.mw, 0.0);
                assert_eq!(frame.online_lines, 19);
            } else {
                assert!(line0.online, "hour {} should be up", frame.hour);
            }
        }
        // 19 of 20 lines still clears the 18-line minimum.
        assert_eq!(result.outage_hours, 0);
    }

    #[test]
    fn full_fleet_outage_is_structural_even_when_pv_serves() {
        // All 20 lines out for hour 12; midday PV alone can carry the load,
        // but the redundant-path rule still books the hour as an outage.
        let events = (1..=20).map(|i| chp_event(i, 12, 1)).collect();
        let config =
            SimConfig::new(24, 42, SimMode::Schedule).with_schedule(Schedule::from_events(events));
        let mut sim = Simulation::new(ArchitectureParams::default(), config, calm_infrastructure());
        let result = sim.run();
        let noon = &sim.frames()[12];
        assert_eq!(noon.online_lines, 0);
        assert!((noon.served_mw - 45.0).abs() < 1e-9, "PV should cover load");
        assert!(noon.outage);
        assert!(!noon.underpowered);
        assert_eq!(result.outage_hours, 1);
        assert!((result.availability - 23.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn hourly_balance_and_soc_bounds_hold_under_failures() {
        let config = SimConfig::new(500, 1, SimMode::Random);
        let arch = ArchitectureParams::default();
        let mut sim = Simulation::new(arch.clone(), config, ReliabilityTable::default());
        sim.run();
        for frame in sim.frames() {
            let sum = frame.pv_mw + frame.bess_discharge_mw + frame.chp_mw + frame.unserved_mw;
            assert!(
                (sum - frame.load_mw).abs() < 1e-9,
                "hour {} unbalanced: {sum}",
                frame.hour
            );
            assert!(frame.bess_soc_mwh >= 0.0);
            assert!(frame.bess_soc_mwh <= arch.bess_energy_mwh + 1e-9);
        }
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let arch = ArchitectureParams::default();
        let table = ReliabilityTable::default();
        let a = run_simulation(arch.clone(), SimConfig::new(400, 9, SimMode::Random), table.clone());
        let b = run_simulation(arch, SimConfig::new(400, 9, SimMode::Random), table);
        assert_eq!(a, b);
    }

    #[test]
    fn reset_replays_identically() {
        let config = SimConfig::new(300, 5, SimMode::Random);
        let mut sim = Simulation::new(
            ArchitectureParams::default(),
            config,
            ReliabilityTable::default(),
        );
        let first = sim.run();
        sim.reset();
        assert!(sim.frames().is_empty());
        let second = sim.run();
        assert_eq!(first, second);
    }

    #[test]
    fn fast_forward_surfaces_last_good_frame() {
        let config = SimConfig::new(168, 42, SimMode::Random);
        let mut sim = Simulation::new(
            ArchitectureParams::default(),
            config,
            ReliabilityTable::default(),
        );
        assert!(sim.fast_forward(0).is_none());
        let frame = sim.fast_forward(24).map(|f| f.hour);
        assert_eq!(frame, Some(23));
        assert_eq!(sim.step().hour, 24);
    }

    #[test]
    fn lost_gas_supply_books_outages_despite_healthy_engines() {
        // Gas main and tank fail within minutes and stay in repair for
        // longer than the run, so the structural path is lost early on
        // while the engines themselves never fail.
        let stuck = vec![RepairBand::new(1.0, 1e9, 1e9)];
        let table = ReliabilityTable {
            chp_engine: ReliabilityParams::new(1e15, vec![RepairBand::new(1.0, 1.0, 1.0)]),
            gas_main: ReliabilityParams::new(0.1, stuck.clone()),
            gas_tank: ReliabilityParams::new(0.1, stuck),
            ..ReliabilityTable::default()
        };
        let config = SimConfig::new(100, 42, SimMode::Random);
        let mut sim = Simulation::new(ArchitectureParams::default(), config, table);
        let result = sim.run();
        assert!(result.availability < 0.9, "{}", result.availability);
        let last = sim.frames().last().unwrap();
        assert!(!last.gas_main_up && !last.gas_tank_up);
        assert!(!last.path_ok);
        // Engines keep serving; the hours are structural outages only.
        assert!(last.unserved_mw < 1e-9);
    }

    #[test]
    fn process_faults_surface_through_the_controller() {
        let table = ReliabilityTable {
            chp_engine: ReliabilityParams::new(0.0, vec![RepairBand::new(1.0, 1.0, 1.0)]),
            ..ReliabilityTable::default()
        };
        let config = SimConfig::new(10, 42, SimMode::Random);
        let mut sim = Simulation::new(ArchitectureParams::default(), config, table);
        sim.run();
        assert!(!sim.faults().is_empty());
    }

    #[test]
    fn diagnostics_window_covers_whole_run() {
        let config = SimConfig::new(200, 3, SimMode::Random);
        let mut sim = Simulation::new(
            ArchitectureParams::default(),
            config,
            ReliabilityTable::default(),
        );
        let result = sim.run();
        let full = sim.diagnostics(None).unwrap();
        let windowed = sim.diagnostics(Some(200)).unwrap();
        assert_eq!(full.overall.availability, windowed.overall.availability);
        assert!((full.overall.availability - result.availability).abs() < 1e-12);
        assert_eq!(windowed.window.hours_analysed, 200);
    }
}
