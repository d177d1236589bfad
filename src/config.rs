//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::reliability::{AssetClass, ReliabilityParams, ReliabilityTable, RepairBand};
use crate::sim::schedule::{Schedule, ScheduleWarning};
use crate::sim::types::{ArchitectureParams, SimConfig, SimMode};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation run parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// As-built plant layout.
    #[serde(default)]
    pub architecture: ArchitectureConfig,
    /// Advisory fleet-sizing parameters.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Per-class failure and repair statistics.
    #[serde(default)]
    pub reliability: ReliabilityTable,
    /// Raw scheduled-outage entries, validated at ingestion.
    #[serde(default)]
    pub schedule: Vec<toml::Value>,
}

/// Simulation run parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of hourly steps to simulate (must be > 0).
    pub hours: usize,
    /// Master random seed.
    pub seed: u64,
    /// Failure mode: `"random"`, `"hybrid"` or `"schedule"`.
    pub mode: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hours: 168,
            seed: 42,
            mode: "random".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Builds the run configuration with the given outage schedule.
    ///
    /// Meant to be called after `validate()`: an unparseable mode falls back
    /// to `random` and zero hours are clamped to one.
    pub fn to_sim_config(&self, schedule: Schedule) -> SimConfig {
        let mode = SimMode::parse(&self.mode).unwrap_or_default();
        SimConfig::new(self.hours.max(1), self.seed, mode).with_schedule(schedule)
    }
}

/// As-built plant layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchitectureConfig {
    /// Installed CHP lines (must be > 0).
    pub num_lines: usize,
    /// Per-line electrical rating (MW).
    pub line_rating_mw: f64,
    /// Power the plant must guarantee (MW); sets the minimum line count.
    pub guaranteed_mw: f64,
    /// Datacenter load to serve every hour (MW).
    pub load_mw: f64,
    /// Installed PV blocks.
    pub pv_blocks: usize,
    /// Per-block PV rating (MW).
    pub pv_block_rating_mw: f64,
    /// BESS maximum power (MW).
    pub bess_power_mw: f64,
    /// BESS energy capacity (MWh).
    pub bess_energy_mwh: f64,
    /// BESS power conversion units.
    pub bess_pcs_units: usize,
    /// BESS battery string groups.
    pub bess_string_groups: usize,
    /// Initial state of charge (0.0–1.0).
    pub bess_initial_soc: f64,
    /// Show idle CHP lines at 10% of rating in per-line frames.
    pub idle_chp_display: bool,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            num_lines: 20,
            line_rating_mw: 2.5,
            guaranteed_mw: 45.0,
            load_mw: 45.0,
            pv_blocks: 8,
            pv_block_rating_mw: 8.0,
            bess_power_mw: 15.0,
            bess_energy_mwh: 60.0,
            bess_pcs_units: 3,
            bess_string_groups: 3,
            bess_initial_soc: 0.5,
            idle_chp_display: false,
        }
    }
}

impl ArchitectureConfig {
    pub fn to_params(&self) -> ArchitectureParams {
        ArchitectureParams {
            num_lines: self.num_lines,
            line_rating_mw: self.line_rating_mw,
            guaranteed_mw: self.guaranteed_mw,
            load_mw: self.load_mw,
            pv_blocks: self.pv_blocks,
            pv_block_rating_mw: self.pv_block_rating_mw,
            bess_power_mw: self.bess_power_mw,
            bess_energy_mwh: self.bess_energy_mwh,
            bess_pcs_units: self.bess_pcs_units,
            bess_string_groups: self.bess_string_groups,
            bess_initial_soc: self.bess_initial_soc,
            idle_chp_display: self.idle_chp_display,
        }
    }
}

/// Advisory fleet-sizing parameters.
///
/// The sizing stage uses the legacy designer's reliability figures, which
/// are deliberately separate from the hourly simulation table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// Availability target in (0, 1).
    pub target_availability: f64,
    /// Candidate engine size (MW).
    pub unit_mw: f64,
    /// Mean time between failures for one engine (hours).
    pub mtbf_hours: f64,
    /// Repair-duration mixture for one engine.
    pub repair_bands: Vec<RepairBand>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            target_availability: 0.999,
            unit_mw: 2.5,
            mtbf_hours: 12_000.0,
            repair_bands: vec![
                RepairBand::new(0.4, 8.0, 24.0),
                RepairBand::new(0.3, 120.0, 300.0),
                RepairBand::new(0.3, 600.0, 1000.0),
            ],
        }
    }
}

impl SizingConfig {
    pub fn to_params(&self) -> ReliabilityParams {
        ReliabilityParams::new(self.mtbf_hours, self.repair_bands.clone())
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.hours"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: one simulated week of the reference
    /// plant under stochastic failures.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            architecture: ArchitectureConfig::default(),
            sizing: SizingConfig::default(),
            reliability: ReliabilityTable::default(),
            schedule: Vec::new(),
        }
    }

    /// Returns the annual preset: a full 8760-hour year.
    pub fn annual() -> Self {
        Self {
            simulation: SimulationConfig {
                hours: 8760,
                ..SimulationConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the maintenance-week preset: hybrid mode with planned
    /// windows on one CHP line, one PV block, and the BESS.
    pub fn maintenance_week() -> Self {
        let schedule = vec![
            outage_entry("chp", 3, 24, 48),
            outage_entry("pv", 2, 30, 10),
            outage_entry("bess", 1, 50, 4),
        ];
        Self {
            simulation: SimulationConfig {
                mode: "hybrid".to_string(),
                ..SimulationConfig::default()
            },
            schedule,
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "annual", "maintenance_week"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "annual" => Ok(Self::annual()),
            "maintenance_week" => Ok(Self::maintenance_week()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates raw schedule entries into outage windows plus warnings.
    pub fn ingest_schedule(&self) -> (Schedule, Vec<ScheduleWarning>) {
        Schedule::ingest(&self.schedule)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.hours == 0 {
            errors.push(ConfigError {
                field: "simulation.hours".into(),
                message: "must be > 0".into(),
            });
        }
        if SimMode::parse(&s.mode).is_none() {
            errors.push(ConfigError {
                field: "simulation.mode".into(),
                message: format!(
                    "must be \"random\", \"hybrid\" or \"schedule\", got \"{}\"",
                    s.mode
                ),
            });
        }

        let a = &self.architecture;
        if a.num_lines == 0 {
            errors.push(ConfigError {
                field: "architecture.num_lines".into(),
                message: "must be > 0".into(),
            });
        }
        if a.line_rating_mw <= 0.0 {
            errors.push(ConfigError {
                field: "architecture.line_rating_mw".into(),
                message: "must be > 0".into(),
            });
        }
        if a.load_mw <= 0.0 {
            errors.push(ConfigError {
                field: "architecture.load_mw".into(),
                message: "must be > 0".into(),
            });
        }
        if a.guaranteed_mw < 0.0 {
            errors.push(ConfigError {
                field: "architecture.guaranteed_mw".into(),
                message: "must be >= 0".into(),
            });
        }
        if a.num_lines > 0 && a.line_rating_mw > 0.0 {
            let params = a.to_params();
            if params.min_lines_required() > a.num_lines {
                errors.push(ConfigError {
                    field: "architecture.guaranteed_mw".into(),
                    message: format!(
                        "requires {} lines but only {} are installed",
                        params.min_lines_required(),
                        a.num_lines
                    ),
                });
            }
        }
        if a.pv_block_rating_mw < 0.0 {
            errors.push(ConfigError {
                field: "architecture.pv_block_rating_mw".into(),
                message: "must be >= 0".into(),
            });
        }
        if a.bess_power_mw < 0.0 {
            errors.push(ConfigError {
                field: "architecture.bess_power_mw".into(),
                message: "must be >= 0".into(),
            });
        }
        if a.bess_energy_mwh < 0.0 {
            errors.push(ConfigError {
                field: "architecture.bess_energy_mwh".into(),
                message: "must be >= 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&a.bess_initial_soc) {
            errors.push(ConfigError {
                field: "architecture.bess_initial_soc".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }

        let z = &self.sizing;
        if !(z.target_availability > 0.0 && z.target_availability < 1.0) {
            errors.push(ConfigError {
                field: "sizing.target_availability".into(),
                message: "must be in (0.0, 1.0)".into(),
            });
        }
        if z.unit_mw <= 0.0 {
            errors.push(ConfigError {
                field: "sizing.unit_mw".into(),
                message: "must be > 0".into(),
            });
        }
        if z.mtbf_hours <= 0.0 {
            errors.push(ConfigError {
                field: "sizing.mtbf_hours".into(),
                message: "must be > 0".into(),
            });
        }
        validate_bands("sizing.repair_bands", &z.repair_bands, &mut errors);

        for class in AssetClass::ALL {
            let params = self.reliability.params(class);
            let field = format!("reliability.{}", class.name());
            if params.mtbf_hours <= 0.0 {
                errors.push(ConfigError {
                    field: format!("{field}.mtbf_hours"),
                    message: "must be > 0".into(),
                });
            }
            validate_bands(&format!("{field}.repair_bands"), &params.repair_bands, &mut errors);
        }

        errors
    }
}

fn outage_entry(asset: &str, index: i64, start: i64, duration: i64) -> toml::Value {
    let mut table = toml::Table::new();
    table.insert("asset_type".to_string(), toml::Value::String(asset.to_string()));
    table.insert("asset_index".to_string(), toml::Value::Integer(index));
    table.insert("start_hour".to_string(), toml::Value::Integer(start));
    table.insert("duration_hours".to_string(), toml::Value::Integer(duration));
    toml::Value::Table(table)
}

fn validate_bands(field: &str, bands: &[RepairBand], errors: &mut Vec<ConfigError>) {
    if bands.is_empty() {
        errors.push(ConfigError {
            field: field.to_string(),
            message: "must not be empty".into(),
        });
        return;
    }
    for (i, band) in bands.iter().enumerate() {
        if band.weight < 0.0 {
            errors.push(ConfigError {
                field: format!("{field}[{i}].weight"),
                message: "must be >= 0".into(),
            });
        }
        if band.low_hours > band.high_hours {
            errors.push(ConfigError {
                field: format!("{field}[{i}].low_hours"),
                message: "must be <= high_hours".into(),
            });
        }
        if band.low_hours < 0.0 {
            errors.push(ConfigError {
                field: format!("{field}[{i}].low_hours"),
                message: "must be >= 0".into(),
            });
        }
    }
    if bands.iter().map(|b| b.weight).sum::<f64>() <= 0.0 {
        errors.push(ConfigError {
            field: field.to_string(),
            message: "weights must sum to > 0".into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_annual() {
        let cfg = ScenarioConfig::from_preset("annual").ok();
        assert_eq!(cfg.map(|c| c.simulation.hours), Some(8760));
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
hours = 720
seed = 99
mode = "hybrid"

[architecture]
num_lines = 22
line_rating_mw = 2.5
guaranteed_mw = 45.0
load_mw = 45.0
pv_blocks = 4
pv_block_rating_mw = 10.0
bess_power_mw = 20.0
bess_energy_mwh = 80.0
bess_pcs_units = 4
bess_string_groups = 4
bess_initial_soc = 0.6
idle_chp_display = true

[sizing]
target_availability = 0.9995
unit_mw = 2.5
mtbf_hours = 12000.0
repair_bands = [
    { weight = 0.4, low_hours = 8.0, high_hours = 24.0 },
    { weight = 0.6, low_hours = 100.0, high_hours = 200.0 },
]

[reliability.chp_engine]
mtbf_hours = 4000.0
repair_bands = [{ weight = 1.0, low_hours = 10.0, high_hours = 30.0 }]

[[schedule]]
asset_type = "chp"
asset_index = 1
start_hour = 100
duration_hours = 24
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.hours), Some(720));
        assert_eq!(cfg.as_ref().map(|c| &*c.simulation.mode), Some("hybrid"));
        assert_eq!(cfg.as_ref().map(|c| c.architecture.num_lines), Some(22));
        assert_eq!(
            cfg.as_ref().map(|c| c.reliability.chp_engine.mtbf_hours),
            Some(4000.0)
        );
        // Untouched classes keep their defaults.
        assert_eq!(
            cfg.as_ref().map(|c| c.reliability.gas_main.mtbf_hours),
            Some(8000.0)
        );
        assert_eq!(cfg.as_ref().map(|c| c.schedule.len()), Some(1));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
hours = 24
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_zero_hours() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.hours = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.hours"));
    }

    #[test]
    fn validation_catches_bad_mode() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.mode = "chaos".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.mode"));
    }

    #[test]
    fn validation_catches_invalid_soc() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.architecture.bess_initial_soc = 1.5;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "architecture.bess_initial_soc")
        );
    }

    #[test]
    fn validation_catches_unreachable_guarantee() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.architecture.guaranteed_mw = 60.0;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "architecture.guaranteed_mw"
                    && e.message.contains("24 lines"))
        );
    }

    #[test]
    fn validation_catches_bad_sizing_target() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.sizing.target_availability = 1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "sizing.target_availability"));
    }

    #[test]
    fn validation_catches_bad_reliability_bands() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.reliability.gas_tank.repair_bands = vec![RepairBand::new(-1.0, 5.0, 2.0)];
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "reliability.gas_tank.repair_bands[0].weight")
        );
        assert!(
            errors
                .iter()
                .any(|e| e.field == "reliability.gas_tank.repair_bands[0].low_hours")
        );
    }

    #[test]
    fn validation_catches_empty_sizing_mixture() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.sizing.repair_bands.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "sizing.repair_bands"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
            let warnings = cfg
                .as_ref()
                .map(|c| c.ingest_schedule().1)
                .unwrap_or_default();
            assert!(
                warnings.is_empty(),
                "preset \"{name}\" schedule should be clean: {warnings:?}"
            );
        }
    }

    #[test]
    fn maintenance_week_preset_runs_hybrid_with_windows() {
        let cfg = ScenarioConfig::maintenance_week();
        assert_eq!(cfg.simulation.mode, "hybrid");
        let (schedule, warnings) = cfg.ingest_schedule();
        assert!(warnings.is_empty());
        assert_eq!(schedule.len(), 3);
        let sim = cfg.simulation.to_sim_config(schedule);
        assert_eq!(sim.mode, SimMode::Hybrid);
        assert_eq!(sim.schedule.len(), 3);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        // seed overridden
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        // hours kept default
        assert_eq!(cfg.as_ref().map(|c| c.simulation.hours), Some(168));
        // architecture kept default
        assert_eq!(cfg.as_ref().map(|c| c.architecture.num_lines), Some(20));
    }

    #[test]
    fn architecture_section_round_trips_to_params() {
        let cfg = ScenarioConfig::baseline();
        let params = cfg.architecture.to_params();
        assert_eq!(params.num_lines, 20);
        assert_eq!(params.min_lines_required(), 18);
        assert_eq!(params.pv_total_mw(), 64.0);
    }

    #[test]
    fn sizing_section_matches_legacy_designer() {
        let params = ScenarioConfig::baseline().sizing.to_params();
        assert!((params.mean_repair_hours() - 309.4).abs() < 1e-9);
        assert!((params.availability() - 12_000.0 / 12_309.4).abs() < 1e-12);
    }
}
