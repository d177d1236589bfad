//! Hour-by-hour record of everything the simulation resolved.

use std::fmt;

/// One CHP line's contribution during a single hour.
#[derive(Debug, Clone, PartialEq)]
pub struct ChpLineFrame {
    /// 1-based line number as shown to operators.
    pub id: usize,
    pub online: bool,
    pub mw: f64,
}

/// One PV block's contribution during a single hour.
#[derive(Debug, Clone, PartialEq)]
pub struct PvBlockFrame {
    /// 1-based block number as shown to operators.
    pub id: usize,
    pub online: bool,
    pub mw: f64,
}

/// Complete snapshot of one simulated hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFrame {
    pub hour: usize,
    pub load_mw: f64,
    pub served_mw: f64,
    pub unserved_mw: f64,
    /// CHP lines available to dispatch after outage masking.
    pub online_lines: usize,
    pub chp_mw: f64,
    pub pv_mw: f64,
    pub bess_discharge_mw: f64,
    pub bess_charge_mw: f64,
    pub bess_soc_mwh: f64,
    pub bess_soc_pct: f64,
    pub chp_lines: Vec<ChpLineFrame>,
    pub pv_blocks: Vec<PvBlockFrame>,
    pub rmu_up: usize,
    pub pcs_up: usize,
    pub strings_up: usize,
    pub swbd_a_up: bool,
    pub swbd_b_up: bool,
    pub gas_main_up: bool,
    pub gas_tank_up: bool,
    /// Redundant-path check: a switchboard and a gas source are live and
    /// enough lines are online to guarantee the committed block.
    pub path_ok: bool,
    /// Served strictly less than the load this hour.
    pub underpowered: bool,
    /// Hour counted against availability.
    pub outage: bool,
}

impl fmt::Display for HistoryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bess_net = self.bess_discharge_mw - self.bess_charge_mw;
        let status = if self.outage {
            "OUTAGE"
        } else if self.underpowered {
            "short"
        } else {
            "ok"
        };
        write!(
            f,
            "hour {:>5}  load {:6.2}  served {:6.2}  lines {:>2}  pv {:5.2}  bess {:+6.2}  soc {:5.1}%  {}",
            self.hour,
            self.load_mw,
            self.served_mw,
            self.online_lines,
            self.pv_mw,
            bess_net,
            self.bess_soc_pct,
            status
        )
    }
}

/// Append-only store of simulated hours.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    frames: Vec<HistoryFrame>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next hour's frame.
    ///
    /// # Panics
    ///
    /// Panics if `frame.hour` is not exactly the next hour, the store is
    /// meaningless with gaps or reordering.
    pub fn push(&mut self, frame: HistoryFrame) {
        assert_eq!(
            frame.hour,
            self.frames.len(),
            "frames must be appended in hour order"
        );
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryFrame> {
        self.frames.last()
    }

    pub fn get(&self, hour: usize) -> Option<&HistoryFrame> {
        self.frames.get(hour)
    }

    pub fn frames(&self) -> &[HistoryFrame] {
        &self.frames
    }
}
