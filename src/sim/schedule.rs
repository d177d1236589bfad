//! Planned maintenance and forced-outage windows.
//!
//! Raw schedule entries arrive from configuration as free-form TOML tables.
//! Ingestion validates every entry up front and keeps only the well-formed
//! ones; each reject becomes a structured warning instead of an error buried
//! in the hourly loop.

use std::fmt;

use tracing::warn;

/// Asset kinds a scheduled outage can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutageAsset {
    Chp,
    Pv,
    Bess,
}

impl OutageAsset {
    pub fn parse(s: &str) -> Option<OutageAsset> {
        match s {
            "chp" => Some(OutageAsset::Chp),
            "pv" => Some(OutageAsset::Pv),
            "bess" => Some(OutageAsset::Bess),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutageAsset::Chp => "chp",
            OutageAsset::Pv => "pv",
            OutageAsset::Bess => "bess",
        }
    }
}

/// Why the asset is taken out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutageKind {
    #[default]
    PlannedMaintenance,
    ForcedOutage,
}

impl OutageKind {
    pub fn parse(s: &str) -> Option<OutageKind> {
        match s {
            "planned_maintenance" => Some(OutageKind::PlannedMaintenance),
            "forced_outage" => Some(OutageKind::ForcedOutage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutageKind::PlannedMaintenance => "planned_maintenance",
            OutageKind::ForcedOutage => "forced_outage",
        }
    }
}

/// One outage window for one asset.
///
/// `asset_index` is 1-based, matching how operators number lines and blocks.
/// The BESS is addressed as a whole through index 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledOutageEvent {
    pub asset: OutageAsset,
    pub asset_index: usize,
    pub start_hour: u64,
    pub duration_hours: u64,
    pub kind: OutageKind,
}

impl ScheduledOutageEvent {
    pub fn new(
        asset: OutageAsset,
        asset_index: usize,
        start_hour: u64,
        duration_hours: u64,
        kind: OutageKind,
    ) -> Self {
        Self {
            asset,
            asset_index,
            start_hour,
            duration_hours,
            kind,
        }
    }

    /// Whether the window covers an absolute simulation hour.
    ///
    /// Zero-duration windows never cover anything.
    pub fn covers(&self, hour: u64) -> bool {
        hour >= self.start_hour && hour < self.start_hour + self.duration_hours
    }

    fn matches(&self, asset: OutageAsset, display_index: usize) -> bool {
        if self.asset != asset {
            return false;
        }
        match asset {
            // The BESS is a single asset; only index 1 addresses it.
            OutageAsset::Bess => self.asset_index == 1,
            _ => self.asset_index == display_index,
        }
    }
}

/// A raw schedule entry that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleWarning {
    /// Zero-based position of the entry in the configuration array.
    pub entry: usize,
    pub message: String,
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schedule entry {}: {}", self.entry, self.message)
    }
}

/// Validated set of outage windows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    events: Vec<ScheduledOutageEvent>,
}

impl Schedule {
    pub fn from_events(events: Vec<ScheduledOutageEvent>) -> Self {
        Self { events }
    }

    /// Validates raw configuration entries, keeping the well-formed ones and
    /// returning a warning per reject.
    pub fn ingest(raw: &[toml::Value]) -> (Schedule, Vec<ScheduleWarning>) {
        let mut events = Vec::new();
        let mut warnings = Vec::new();
        for (entry, value) in raw.iter().enumerate() {
            match parse_entry(value) {
                Ok(ev) => events.push(ev),
                Err(message) => {
                    warn!(entry, %message, "dropping malformed schedule entry");
                    warnings.push(ScheduleWarning { entry, message });
                }
            }
        }
        (Schedule { events }, warnings)
    }

    pub fn events(&self) -> &[ScheduledOutageEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any window covers the given asset at the given hour.
    ///
    /// `display_index` is 1-based; pass 1 for the BESS.
    pub fn is_outage(&self, asset: OutageAsset, display_index: usize, hour: u64) -> bool {
        self.events
            .iter()
            .any(|ev| ev.matches(asset, display_index) && ev.covers(hour))
    }
}

fn parse_entry(value: &toml::Value) -> Result<ScheduledOutageEvent, String> {
    let table = value
        .as_table()
        .ok_or_else(|| "entry is not a table".to_string())?;

    let asset_str = table
        .get("asset_type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing or non-string asset_type".to_string())?;
    let asset = OutageAsset::parse(asset_str)
        .ok_or_else(|| format!("unknown asset_type {asset_str:?}"))?;

    let asset_index = read_integer(table, "asset_index")?;
    if asset_index < 1 {
        return Err(format!("asset_index must be >= 1, got {asset_index}"));
    }
    let start_hour = read_integer(table, "start_hour")?;
    if start_hour < 0 {
        return Err(format!("start_hour must be >= 0, got {start_hour}"));
    }
    let duration_hours = read_integer(table, "duration_hours")?;
    if duration_hours <= 0 {
        return Err(format!(
            "duration_hours must be positive, got {duration_hours}"
        ));
    }

    let kind = match table.get("event_type") {
        None => OutageKind::default(),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| "non-string event_type".to_string())?;
            OutageKind::parse(s).ok_or_else(|| format!("unknown event_type {s:?}"))?
        }
    };

    Ok(ScheduledOutageEvent::new(
        asset,
        asset_index as usize,
        start_hour as u64,
        duration_hours as u64,
        kind,
    ))
}

fn read_integer(table: &toml::Table, key: &str) -> Result<i64, String> {
    table
        .get(key)
        .and_then(|v| v.as_integer())
        .ok_or_else(|| format!("missing or non-integer {key}"))
}
