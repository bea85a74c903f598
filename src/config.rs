//! Configuration file handling.
//!
//! Settings load from `district_scatter.toml` and are then overridden by
//! command-line flags.

use crate::cli::{DataArgs, ModeArg, PresetArg};
use crate::data::{GroupKeys, RangeOverrides, Reduction};
use crate::pipeline::PlotSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "district_scatter.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub aggregate: AggregateConfig,

    #[serde(default)]
    pub series: SeriesConfig,

    #[serde(default)]
    pub range: RangeConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Input file and the fields it is grouped and filtered by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Top-level grouping field (one point per value).
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Second-level grouping field (splits each point into x and y).
    #[serde(default = "default_secondary_key")]
    pub secondary_key: String,

    #[serde(default = "default_year_field")]
    pub year_field: String,

    /// Years offered by the dropdown. Empty means "use what the CSV has".
    #[serde(default = "default_years")]
    pub years: Vec<u16>,

    /// Year selected at startup. `0` starts on all years.
    #[serde(default = "default_year")]
    pub default_year: Option<u16>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            primary_key: default_primary_key(),
            secondary_key: default_secondary_key(),
            year_field: default_year_field(),
            years: default_years(),
            default_year: default_year(),
        }
    }
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("crime.csv")
}

fn default_primary_key() -> String {
    "district".to_string()
}

fn default_secondary_key() -> String {
    "shooting".to_string()
}

fn default_year_field() -> String {
    "year".to_string()
}

fn default_years() -> Vec<u16> {
    vec![2018, 2017, 2016, 2015]
}

fn default_year() -> Option<u16> {
    Some(2018)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMode {
    Sum,
    Count,
}

/// Reduction applied to each (district, flag) bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    #[serde(default = "default_mode")]
    pub mode: ReductionMode,

    /// Field summed when `mode = "sum"`.
    #[serde(default = "default_sum_field")]
    pub sum_field: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            sum_field: default_sum_field(),
        }
    }
}

impl AggregateConfig {
    pub fn reduction(&self) -> Reduction {
        match self.mode {
            ReductionMode::Sum => Reduction::Sum(self.sum_field.clone()),
            ReductionMode::Count => Reduction::Count,
        }
    }
}

fn default_mode() -> ReductionMode {
    ReductionMode::Sum
}

fn default_sum_field() -> String {
    "amount".to_string()
}

/// Second-level keys plotted on each axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    #[serde(default = "default_x_key")]
    pub x_key: String,

    /// The non-shooting flag is an empty cell.
    #[serde(default)]
    pub y_key: String,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            x_key: default_x_key(),
            y_key: String::new(),
        }
    }
}

fn default_x_key() -> String {
    "Y".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    #[serde(flatten)]
    pub overrides: RangeOverrides,

    /// Axes come from every year, so they stay put when the year changes.
    #[serde(default = "default_fixed_axes")]
    pub fixed_axes: bool,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            overrides: RangeOverrides::default(),
            fixed_axes: default_fixed_axes(),
        }
    }
}

fn default_fixed_axes() -> bool {
    true
}

/// Canvas geometry and text, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub plot_left: f64,
    pub plot_right: f64,
    pub plot_top: f64,
    pub plot_bottom: f64,
    /// Added on both sides of the x extent.
    pub x_padding: f64,
    /// Added on both sides of the y extent.
    pub y_padding: f64,
    pub point_radius: u32,
    pub point_color: String,
    pub tick_count: usize,
    pub title: String,
    pub title_pos: (i32, i32),
    pub title_size: u32,
    pub x_label: String,
    pub x_label_pos: (i32, i32),
    pub y_label: String,
    pub y_label_pos: (i32, i32),
    pub label_size: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            plot_left: 50.0,
            plot_right: 450.0,
            plot_top: 50.0,
            plot_bottom: 450.0,
            x_padding: 0.5,
            y_padding: 5.0,
            point_radius: 5,
            point_color: "#4286f4".to_string(),
            tick_count: 10,
            title: "Shooting vs. Non-shooting Crimes by District".to_string(),
            title_pos: (100, 40),
            title_size: 19,
            x_label: "Shooting Crime Frequency".to_string(),
            x_label_pos: (130, 490),
            y_label: "Non-Shooting Crime Frequency".to_string(),
            y_label_pos: (15, 300),
            label_size: 13,
        }
    }
}

impl LayoutConfig {
    /// Point colour as RGB.
    pub fn point_rgb(&self) -> Result<(u8, u8, u8)> {
        parse_hex_color(&self.point_color)
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Result<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid colour '{}', expected #rrggbb", value);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .with_context(|| format!("Invalid colour '{}'", value))
    };
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Explicit path first, then `district_scatter.toml`, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        debug!("No config file, using defaults");
        Ok(Self::default())
    }

    /// Check settings that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.plot_left >= layout.plot_right || layout.plot_top >= layout.plot_bottom {
            bail!("Layout plot area is empty or inverted");
        }
        if layout.width == 0 || layout.height == 0 {
            bail!("Layout width and height must be positive");
        }
        layout.point_rgb()?;
        if self.aggregate.mode == ReductionMode::Sum && self.aggregate.sum_field.is_empty() {
            bail!("aggregate.sum_field is required when mode = \"sum\"");
        }
        Ok(())
    }

    /// Apply a named preset. Flags applied afterwards still win.
    pub fn apply_preset(&mut self, preset: PresetArg) {
        match preset {
            PresetArg::Amount => {
                self.aggregate.mode = ReductionMode::Sum;
                self.aggregate.sum_field = default_sum_field();
                self.range.overrides.y_min = None;
            }
            PresetArg::Count => {
                self.aggregate.mode = ReductionMode::Count;
                // Carried over from the count-based chart; product has not said why
                self.range.overrides.y_min = Some(1026.0);
            }
        }
    }

    /// Merge command-line arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &DataArgs) {
        if let Some(preset) = args.preset {
            self.apply_preset(preset);
        }
        if let Some(ref csv) = args.csv {
            self.data.csv_path = csv.clone();
        }
        if let Some(mode) = args.mode {
            self.aggregate.mode = match mode {
                ModeArg::Sum => ReductionMode::Sum,
                ModeArg::Count => ReductionMode::Count,
            };
        }
        if let Some(ref field) = args.sum_field {
            self.aggregate.sum_field = field.clone();
        }
        if let Some(y_min) = args.y_min {
            self.range.overrides.y_min = Some(y_min);
        }
        if args.follow_filter {
            self.range.fixed_axes = false;
        }
    }

    /// Year filter to start with: `--all-years`, `--year`, then the default.
    pub fn initial_year(&self, args: &DataArgs) -> Option<String> {
        if args.all_years {
            return None;
        }
        args.year
            .clone()
            .or_else(|| {
                self.data
                    .default_year
                    .filter(|&y| y != 0)
                    .map(|y| y.to_string())
            })
    }

    pub fn plot_settings(&self) -> PlotSettings {
        PlotSettings {
            keys: GroupKeys::two(&self.data.primary_key, &self.data.secondary_key),
            reduction: self.aggregate.reduction(),
            year_field: self.data.year_field.clone(),
            x_key: self.series.x_key.clone(),
            y_key: self.series.y_key.clone(),
            overrides: self.range.overrides,
            fixed_axes: self.range.fixed_axes,
        }
    }

    /// Columns the CSV must have for the current settings.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.data.primary_key.as_str(),
            self.data.secondary_key.as_str(),
            self.data.year_field.as_str(),
        ];
        if self.aggregate.mode == ReductionMode::Sum {
            columns.push(self.aggregate.sum_field.as_str());
        }
        columns
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }
}
