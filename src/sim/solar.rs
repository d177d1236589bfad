//! Deterministic solar irradiance profile shared by every PV block.

use std::f64::consts::PI;

/// Hour at which PV output starts (inclusive).
pub const SUNRISE_HOUR: u64 = 6;
/// Hour at which PV output ends (inclusive).
pub const SUNSET_HOUR: u64 = 18;

/// Irradiance as a fraction of nameplate rating for an absolute sim hour.
///
/// The profile is a half-sine between [`SUNRISE_HOUR`] and [`SUNSET_HOUR`]
/// repeating every 24 hours, with zero output at night. Weather variation is
/// not modelled; block-level failures provide the stochastic part of PV.
pub fn irradiance_fraction(hour: u64) -> f64 {
    let h = hour % 24;
    if !(SUNRISE_HOUR..=SUNSET_HOUR).contains(&h) {
        return 0.0;
    }
    let x = (h - SUNRISE_HOUR) as f64 / (SUNSET_HOUR - SUNRISE_HOUR) as f64 * PI;
    x.sin().max(0.0)
}
