//! Post-run aggregate statistics computed over recorded history frames.

use std::fmt;

use crate::sim::history::HistoryFrame;
use crate::sim::types::ArchitectureParams;

/// Which slice of the run the window-scoped statistics cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticsWindow {
    pub total_hours_simulated: usize,
    pub hours_analysed: usize,
    /// First analysed hour (inclusive).
    pub from_hour: usize,
    /// Last analysed hour (inclusive).
    pub to_hour: usize,
}

/// Headline service statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverallStats {
    pub load_mw: f64,
    /// Mean served power over the window.
    pub avg_power_mw: f64,
    pub fraction_hours_underpowered: f64,
    /// Always over the full run, whatever the window.
    pub availability: f64,
    /// Underpowered hours inside the window.
    pub hours_underpowered: usize,
    /// Full-run counter of hours served below load.
    pub hours_below_load: usize,
}

/// Energy totals and shares over the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyStats {
    pub total_served_mwh: f64,
    pub pv_mwh: f64,
    pub bess_discharge_mwh: f64,
    pub pv_share: f64,
    pub bess_share: f64,
}

/// Battery behaviour over the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BessStats {
    pub avg_soc_pct: f64,
    pub fraction_hours_soc_below_20: f64,
    /// Fraction of hours with nonzero discharge.
    pub fraction_hours_used: f64,
}

/// PV behaviour over the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvStats {
    pub avg_pv_mw: f64,
    pub fraction_hours_with_pv: f64,
}

/// One CHP line's service record over the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChpLineStats {
    /// 1-based line number.
    pub id: usize,
    pub uptime_fraction: f64,
    pub avg_load_fraction: f64,
}

/// Fleet-wide CHP statistics over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChpFleetStats {
    pub fleet_uptime_avg: f64,
    pub fleet_avg_load_frac: f64,
    /// Population standard deviation of per-line average load fractions.
    pub load_imbalance_index: f64,
    pub per_line: Vec<ChpLineStats>,
}

/// Up/down flags from the final simulated hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfrastructureSnapshot {
    pub gas_main_up: bool,
    pub gas_tank_up: bool,
    pub swbd_a_up: bool,
    pub swbd_b_up: bool,
}

/// Read-only aggregate over recorded frames.
///
/// All statistics are window-scoped except `overall.availability` and
/// `overall.hours_below_load`, which always describe the full run, and the
/// infrastructure snapshot, which is the last simulated hour.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub window: DiagnosticsWindow,
    pub overall: OverallStats,
    pub energy: EnergyStats,
    pub bess: BessStats,
    pub pv: PvStats,
    pub chp: ChpFleetStats,
    pub infrastructure: InfrastructureSnapshot,
}

impl Diagnostics {
    /// Aggregates the last `window` hours, or the whole run when `None`.
    ///
    /// Returns `None` when there is nothing to analyse yet: no frames, or a
    /// zero-width window.
    pub fn compute(
        frames: &[HistoryFrame],
        arch: &ArchitectureParams,
        outage_hours: usize,
        hours_below_load: usize,
        window: Option<usize>,
    ) -> Option<Diagnostics> {
        let total = frames.len();
        let analysed = window.map_or(total, |n| n.min(total));
        if analysed == 0 {
            return None;
        }
        let from_hour = total - analysed;
        let slice = &frames[from_hour..];
        let hours = analysed as f64;

        let availability = 1.0 - outage_hours as f64 / total as f64;
        let hours_underpowered = slice.iter().filter(|f| f.underpowered).count();
        let avg_power_mw = slice.iter().map(|f| f.served_mw).sum::<f64>() / hours;

        // One-hour steps, so MW sums are MWh totals.
        let total_served_mwh: f64 = slice.iter().map(|f| f.served_mw).sum();
        let pv_mwh: f64 = slice.iter().map(|f| f.pv_mw).sum();
        let bess_discharge_mwh: f64 = slice.iter().map(|f| f.bess_discharge_mw).sum();
        let (pv_share, bess_share) = if total_served_mwh > 0.0 {
            (
                pv_mwh / total_served_mwh,
                bess_discharge_mwh / total_served_mwh,
            )
        } else {
            (0.0, 0.0)
        };

        let avg_soc_pct = slice.iter().map(|f| f.bess_soc_pct).sum::<f64>() / hours;
        let soc_low = slice.iter().filter(|f| f.bess_soc_pct < 20.0).count();
        let bess_used = slice.iter().filter(|f| f.bess_discharge_mw > 1e-6).count();

        let avg_pv_mw = pv_mwh / hours;
        let pv_hours = slice.iter().filter(|f| f.pv_mw > 1e-6).count();

        let rating = arch.line_rating_mw.max(1e-9);
        let mut per_line = Vec::with_capacity(arch.num_lines);
        for line in 0..arch.num_lines {
            let mut up_hours = 0usize;
            let mut load_frac_sum = 0.0;
            for frame in slice {
                if let Some(entry) = frame.chp_lines.get(line) {
                    if entry.online {
                        up_hours += 1;
                    }
                    load_frac_sum += entry.mw / rating;
                }
            }
            per_line.push(ChpLineStats {
                id: line + 1,
                uptime_fraction: up_hours as f64 / hours,
                avg_load_fraction: load_frac_sum / hours,
            });
        }
        let lines = arch.num_lines.max(1) as f64;
        let fleet_uptime_avg = per_line.iter().map(|l| l.uptime_fraction).sum::<f64>() / lines;
        let fleet_avg_load_frac =
            per_line.iter().map(|l| l.avg_load_fraction).sum::<f64>() / lines;
        let variance = per_line
            .iter()
            .map(|l| (l.avg_load_fraction - fleet_avg_load_frac).powi(2))
            .sum::<f64>()
            / lines;
        let load_imbalance_index = variance.sqrt();

        let last = frames.last()?;
        let infrastructure = InfrastructureSnapshot {
            gas_main_up: last.gas_main_up,
            gas_tank_up: last.gas_tank_up,
            swbd_a_up: last.swbd_a_up,
            swbd_b_up: last.swbd_b_up,
        };

        Some(Diagnostics {
            window: DiagnosticsWindow {
                total_hours_simulated: total,
                hours_analysed: analysed,
                from_hour,
                to_hour: total - 1,
            },
            overall: OverallStats {
                load_mw: arch.load_mw,
                avg_power_mw,
                fraction_hours_underpowered: hours_underpowered as f64 / hours,
                availability,
                hours_underpowered,
                hours_below_load,
            },
            energy: EnergyStats {
                total_served_mwh,
                pv_mwh,
                bess_discharge_mwh,
                pv_share,
                bess_share,
            },
            bess: BessStats {
                avg_soc_pct,
                fraction_hours_soc_below_20: soc_low as f64 / hours,
                fraction_hours_used: bess_used as f64 / hours,
            },
            pv: PvStats {
                avg_pv_mw,
                fraction_hours_with_pv: pv_hours as f64 / hours,
            },
            chp: ChpFleetStats {
                fleet_uptime_avg,
                fleet_avg_load_frac,
                load_imbalance_index,
                per_line,
            },
            infrastructure,
        })
    }
}

fn up_or_down(up: bool) -> &'static str {
    if up { "up" } else { "DOWN" }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Diagnostics ---")?;
        writeln!(
            f,
            "window                 : hours {}..{} ({} of {} analysed)",
            self.window.from_hour,
            self.window.to_hour,
            self.window.hours_analysed,
            self.window.total_hours_simulated
        )?;
        writeln!(
            f,
            "availability (run)     : {:.4} %",
            self.overall.availability * 100.0
        )?;
        writeln!(
            f,
            "avg power served       : {:.2} MW of {:.2} MW",
            self.overall.avg_power_mw, self.overall.load_mw
        )?;
        writeln!(
            f,
            "hours underpowered     : {} ({:.2} % of window, {} in full run)",
            self.overall.hours_underpowered,
            self.overall.fraction_hours_underpowered * 100.0,
            self.overall.hours_below_load
        )?;
        writeln!(
            f,
            "energy served          : {:.1} MWh (pv {:.2} %, bess {:.2} %)",
            self.energy.total_served_mwh,
            self.energy.pv_share * 100.0,
            self.energy.bess_share * 100.0
        )?;
        writeln!(
            f,
            "bess avg soc           : {:.1} % (below 20 %: {:.2} % of hours, discharging: {:.2} %)",
            self.bess.avg_soc_pct,
            self.bess.fraction_hours_soc_below_20 * 100.0,
            self.bess.fraction_hours_used * 100.0
        )?;
        writeln!(
            f,
            "pv avg output          : {:.2} MW ({:.2} % of hours producing)",
            self.pv.avg_pv_mw,
            self.pv.fraction_hours_with_pv * 100.0
        )?;
        writeln!(
            f,
            "chp fleet uptime       : {:.2} % (avg load {:.2} %, imbalance {:.4})",
            self.chp.fleet_uptime_avg * 100.0,
            self.chp.fleet_avg_load_frac * 100.0,
            self.chp.load_imbalance_index
        )?;
        for line in &self.chp.per_line {
            writeln!(
                f,
                "  line {:>2}              : uptime {:6.2} %  avg load {:6.2} %",
                line.id,
                line.uptime_fraction * 100.0,
                line.avg_load_fraction * 100.0
            )?;
        }
        writeln!(
            f,
            "infrastructure         : swbd A {}, swbd B {}, gas main {}, gas tank {}",
            up_or_down(self.infrastructure.swbd_a_up),
            up_or_down(self.infrastructure.swbd_b_up),
            up_or_down(self.infrastructure.gas_main_up),
            up_or_down(self.infrastructure.gas_tank_up)
        )
    }
}
