//! Analyzer configuration.
//!
//! Every threshold used by the filter lives in [`FilterConfig`]; the defaults
//! are the values the marketplace filter has always shipped with. Settings are
//! read from an optional TOML file and then overridden from the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;
use crate::normalize::OWNED_MARKER;

// ============================================================================
// Filter thresholds
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Sales in the window needed for the lower margin factor
    #[serde(default = "default_min_sales_normal")]
    pub min_sales_normal: usize,

    /// Below this many sales an item is rejected outright
    #[serde(default = "default_min_sales_exception")]
    pub min_sales_exception: usize,

    /// Max/min ratio allowed when the average price is at least `low_price_boundary`
    #[serde(default = "default_consistency_strict")]
    pub price_consistency_threshold_strict: f64,

    /// Max/min ratio allowed for cheap items
    #[serde(default = "default_consistency_low_price")]
    pub price_consistency_threshold_low_price: f64,

    #[serde(default = "default_low_price_boundary")]
    pub low_price_boundary: f64,

    /// Margin factor for items with at least `min_sales_normal` sales
    #[serde(default = "default_profit_margin_normal")]
    pub profit_margin_normal: f64,

    /// Margin factor for items between the two sales limits
    #[serde(default = "default_profit_margin_exception")]
    pub profit_margin_exception: f64,

    /// Width of the trailing sales window
    #[serde(default = "default_sales_window_days")]
    pub sales_window_days: i64,

    /// Suffix marking an item already held by the collecting account
    #[serde(default = "default_owned_marker")]
    pub owned_marker: String,

    /// When set, a good candidate must also have consistent recent prices.
    /// The margin override is unaffected.
    #[serde(default)]
    pub require_price_consistency: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_sales_normal: default_min_sales_normal(),
            min_sales_exception: default_min_sales_exception(),
            price_consistency_threshold_strict: default_consistency_strict(),
            price_consistency_threshold_low_price: default_consistency_low_price(),
            low_price_boundary: default_low_price_boundary(),
            profit_margin_normal: default_profit_margin_normal(),
            profit_margin_exception: default_profit_margin_exception(),
            sales_window_days: default_sales_window_days(),
            owned_marker: default_owned_marker(),
            require_price_consistency: false,
        }
    }
}

/// Widest sales window accepted from a settings file.
pub const MAX_SALES_WINDOW_DAYS: i64 = 36_500;

impl FilterConfig {
    /// Rejects values the filter cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=MAX_SALES_WINDOW_DAYS).contains(&self.sales_window_days) {
            return Err(format!(
                "sales_window_days must be between 0 and {}, got {}",
                MAX_SALES_WINDOW_DAYS, self.sales_window_days
            ));
        }

        let ratios = [
            ("price_consistency_threshold_strict", self.price_consistency_threshold_strict),
            ("price_consistency_threshold_low_price", self.price_consistency_threshold_low_price),
            ("low_price_boundary", self.low_price_boundary),
            ("profit_margin_normal", self.profit_margin_normal),
            ("profit_margin_exception", self.profit_margin_exception),
        ];
        for (field, value) in ratios {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", field, value));
            }
        }

        Ok(())
    }
}

fn default_min_sales_normal() -> usize {
    15
}

fn default_min_sales_exception() -> usize {
    7
}

fn default_consistency_strict() -> f64 {
    1.20
}

fn default_consistency_low_price() -> f64 {
    4.2
}

fn default_low_price_boundary() -> f64 {
    5.0
}

fn default_profit_margin_normal() -> f64 {
    1.15
}

fn default_profit_margin_exception() -> f64 {
    1.30
}

fn default_sales_window_days() -> i64 {
    30
}

fn default_owned_marker() -> String {
    OWNED_MARKER.to_string()
}

// ============================================================================
// Batch settings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Raw items; defaults to `<data_dir>/aggregated/items_all.json`
    #[serde(default)]
    pub input: Option<PathBuf>,

    #[serde(default)]
    pub good_output: Option<PathBuf>,

    #[serde(default)]
    pub bad_output: Option<PathBuf>,

    /// Write one record per line instead of a single array
    #[serde(default)]
    pub ndjson: bool,

    /// Optional per-record verdict dump (always NDJSON)
    #[serde(default)]
    pub report: Option<PathBuf>,

    #[serde(default)]
    pub filters: FilterConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            input: None,
            good_output: None,
            bad_output: None,
            ndjson: false,
            report: None,
            filters: FilterConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Settings {
    /// Reads settings from a TOML file, or returns the defaults without one.
    pub fn load(path: Option<&Path>) -> Result<Self, AnalyzerError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| AnalyzerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings = toml::from_str(&text).map_err(|source| AnalyzerError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        settings
            .filters
            .validate()
            .map_err(|message| AnalyzerError::InvalidSetting {
                path: path.to_path_buf(),
                message,
            })?;

        Ok(settings)
    }

    fn aggregated_dir(&self) -> PathBuf {
        self.data_dir.join("aggregated")
    }

    pub fn input_path(&self) -> PathBuf {
        self.input
            .clone()
            .unwrap_or_else(|| self.aggregated_dir().join("items_all.json"))
    }

    pub fn good_output_path(&self) -> PathBuf {
        self.good_output
            .clone()
            .unwrap_or_else(|| self.aggregated_dir().join("good_items.json"))
    }

    pub fn bad_output_path(&self) -> PathBuf {
        self.bad_output
            .clone()
            .unwrap_or_else(|| self.aggregated_dir().join("bad_items.json"))
    }
}
