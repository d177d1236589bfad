//! Hourly merit-order dispatch: PV first, then storage, then the CHP fleet.

use crate::sim::bess::{BessLimits, BessState};

/// Fraction of rating shown for idle lines when the display convention is on.
pub const IDLE_DISPLAY_FRACTION: f64 = 0.1;

/// Power flows resolved for one hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HourDispatch {
    pub pv_mw: f64,
    pub bess_discharge_mw: f64,
    pub bess_charge_mw: f64,
    pub chp_mw: f64,
    /// Per-line output indexed like the fleet, zero for down lines. Carries
    /// the idle display value when that convention is enabled.
    pub per_line_mw: Vec<f64>,
    pub served_mw: f64,
    pub unserved_mw: f64,
}

/// Serves the load for one hour.
///
/// PV is taken first, storage covers the next slice, and whatever remains is
/// split evenly across healthy CHP lines up to their rating. Leftover PV
/// charges the battery. Lines never reassign each other's share: if the even
/// split exceeds a line's rating the excess goes unserved rather than being
/// pushed onto its neighbours.
pub fn dispatch_hour(
    load_mw: f64,
    chp_up: &[bool],
    line_rating_mw: f64,
    pv_available_mw: f64,
    bess: &mut BessState,
    limits: BessLimits,
    idle_chp_display: bool,
) -> HourDispatch {
    let mut remaining = load_mw.max(0.0);

    let pv_mw = remaining.min(pv_available_mw.max(0.0));
    remaining -= pv_mw;

    let bess_discharge_mw = bess.discharge(remaining, limits);
    remaining -= bess_discharge_mw;

    let online = chp_up.iter().filter(|up| **up).count();
    let mut per_line_mw = vec![0.0; chp_up.len()];
    let mut chp_mw = 0.0;
    if online > 0 {
        if remaining > 0.0 {
            let per_line = (remaining / online as f64).min(line_rating_mw);
            for (line, up) in chp_up.iter().enumerate() {
                if *up {
                    per_line_mw[line] = per_line;
                }
            }
            chp_mw = per_line * online as f64;
        } else if idle_chp_display {
            // Visualization-only tickover; never counted as served energy.
            let idle = IDLE_DISPLAY_FRACTION * line_rating_mw;
            for (line, up) in chp_up.iter().enumerate() {
                if *up {
                    per_line_mw[line] = idle;
                }
            }
        }
    }

    let surplus = (pv_available_mw - pv_mw).max(0.0);
    let bess_charge_mw = bess.charge(surplus, limits);

    let served_mw = pv_mw + bess_discharge_mw + chp_mw;
    let unserved_mw = (load_mw - served_mw).max(0.0);

    HourDispatch {
        pv_mw,
        bess_discharge_mw,
        bess_charge_mw,
        chp_mw,
        per_line_mw,
        served_mw,
        unserved_mw,
    }
}
