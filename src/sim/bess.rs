//! Battery energy storage with PCS and string-group derating.

use crate::sim::types::ArchitectureParams;

/// Effective BESS limits for one hour after failure derating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BessLimits {
    /// Maximum charge/discharge power this hour (MW).
    pub power_mw: f64,
    /// Maximum usable energy this hour (MWh).
    pub energy_mwh: f64,
}

/// Battery state carried across the run.
///
/// Each PCS unit carries an equal share of the power rating and each string
/// group an equal share of the energy rating, so failures derate the unit
/// pro rata. With one-hour steps, MW and MWh trade one for one.
#[derive(Debug, Clone)]
pub struct BessState {
    power_rating_mw: f64,
    energy_rating_mwh: f64,
    pcs_units: usize,
    string_groups: usize,
    soc_mwh: f64,
}

impl BessState {
    pub fn new(arch: &ArchitectureParams) -> Self {
        let energy_rating_mwh = arch.bess_energy_mwh.max(0.0);
        Self {
            power_rating_mw: arch.bess_power_mw.max(0.0),
            energy_rating_mwh,
            pcs_units: arch.bess_pcs_units,
            string_groups: arch.bess_string_groups,
            soc_mwh: arch.bess_initial_soc.clamp(0.0, 1.0) * energy_rating_mwh,
        }
    }

    /// Stored energy (MWh).
    pub fn soc_mwh(&self) -> f64 {
        self.soc_mwh
    }

    /// Stored energy as a fraction of the nameplate energy rating.
    pub fn soc_fraction(&self) -> f64 {
        if self.energy_rating_mwh <= 0.0 {
            return 0.0;
        }
        self.soc_mwh / self.energy_rating_mwh
    }

    /// Applies this hour's failure state and returns the effective limits.
    ///
    /// Energy stored on failed string groups is stranded: the state of
    /// charge is clamped down to the derated energy window.
    pub fn derate(&mut self, pcs_up: usize, strings_up: usize) -> BessLimits {
        let power_mw = self.power_rating_mw * pcs_up as f64 / self.pcs_units.max(1) as f64;
        let energy_mwh =
            self.energy_rating_mwh * strings_up as f64 / self.string_groups.max(1) as f64;
        self.soc_mwh = self.soc_mwh.min(energy_mwh);
        BessLimits {
            power_mw,
            energy_mwh,
        }
    }

    /// Discharges up to `requested_mw` for one hour within the given limits.
    /// Returns the power actually served.
    pub fn discharge(&mut self, requested_mw: f64, limits: BessLimits) -> f64 {
        if limits.power_mw <= 0.0 || self.soc_mwh <= 0.0 {
            return 0.0;
        }
        let served = requested_mw.min(limits.power_mw).min(self.soc_mwh).max(0.0);
        self.soc_mwh -= served;
        served
    }

    /// Absorbs up to `surplus_mw` of excess generation for one hour.
    /// Returns the power actually accepted.
    pub fn charge(&mut self, surplus_mw: f64, limits: BessLimits) -> f64 {
        if limits.power_mw <= 0.0 {
            return 0.0;
        }
        let headroom = (limits.energy_mwh - self.soc_mwh).max(0.0);
        let accepted = surplus_mw.min(limits.power_mw).min(headroom).max(0.0);
        self.soc_mwh += accepted;
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> ArchitectureParams {
        ArchitectureParams {
            bess_power_mw: 15.0,
            bess_energy_mwh: 60.0,
            bess_pcs_units: 3,
            bess_string_groups: 3,
            bess_initial_soc: 0.5,
            ..ArchitectureParams::default()
        }
    }

    fn healthy(bess: &mut BessState) -> BessLimits {
        bess.derate(3, 3)
    }

    #[test]
    fn starts_at_initial_soc() {
        let bess = BessState::new(&arch());
        assert_eq!(bess.soc_mwh(), 30.0);
        assert_eq!(bess.soc_fraction(), 0.5);
    }

    #[test]
    fn derating_scales_with_units_up() {
        let mut bess = BessState::new(&arch());
        let limits = bess.derate(1, 3);
        assert_eq!(limits.power_mw, 5.0);
        assert_eq!(limits.energy_mwh, 60.0);

        let limits = bess.derate(0, 0);
        assert_eq!(limits.power_mw, 0.0);
        assert_eq!(limits.energy_mwh, 0.0);
    }

    #[test]
    fn failed_strings_strand_stored_energy() {
        let mut bess = BessState::new(&arch());
        let limits = bess.derate(3, 1);
        assert_eq!(limits.energy_mwh, 20.0);
        assert_eq!(bess.soc_mwh(), 20.0);
    }

    #[test]
    fn discharge_respects_power_and_energy() {
        let mut bess = BessState::new(&arch());
        let limits = healthy(&mut bess);
        assert_eq!(bess.discharge(10.0, limits), 10.0);
        assert_eq!(bess.soc_mwh(), 20.0);
        // Above power rating.
        assert_eq!(bess.discharge(50.0, limits), 15.0);
        assert_eq!(bess.soc_mwh(), 5.0);
        // Above remaining energy.
        assert_eq!(bess.discharge(10.0, limits), 5.0);
        assert_eq!(bess.soc_mwh(), 0.0);
        assert_eq!(bess.discharge(10.0, limits), 0.0);
    }

    #[test]
    fn discharge_blocked_when_all_pcs_down() {
        let mut bess = BessState::new(&arch());
        let limits = bess.derate(0, 3);
        assert_eq!(bess.discharge(10.0, limits), 0.0);
        assert_eq!(bess.soc_mwh(), 30.0);
    }

    #[test]
    fn charge_respects_headroom() {
        let mut bess = BessState::new(&arch());
        let limits = healthy(&mut bess);
        assert_eq!(bess.charge(10.0, limits), 10.0);
        assert_eq!(bess.soc_mwh(), 40.0);
        // 20 MWh headroom left but power caps at 15.
        assert_eq!(bess.charge(50.0, limits), 15.0);
        assert_eq!(bess.soc_mwh(), 55.0);
        assert_eq!(bess.charge(50.0, limits), 5.0);
        assert_eq!(bess.soc_mwh(), 60.0);
        assert_eq!(bess.charge(50.0, limits), 0.0);
    }

    #[test]
    fn negative_requests_are_ignored() {
        let mut bess = BessState::new(&arch());
        let limits = healthy(&mut bess);
        assert_eq!(bess.discharge(-5.0, limits), 0.0);
        assert_eq!(bess.charge(-5.0, limits), 0.0);
        assert_eq!(bess.soc_mwh(), 30.0);
    }

    #[test]
    fn zero_energy_system_is_inert() {
        let mut arch = arch();
        arch.bess_power_mw = 0.0;
        arch.bess_energy_mwh = 0.0;
        arch.bess_pcs_units = 0;
        arch.bess_string_groups = 0;
        let mut bess = BessState::new(&arch);
        let limits = bess.derate(0, 0);
        assert_eq!(bess.discharge(10.0, limits), 0.0);
        assert_eq!(bess.charge(10.0, limits), 0.0);
        assert_eq!(bess.soc_fraction(), 0.0);
    }
}
