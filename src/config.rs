//! Editor configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are the base layer; a user `config.toml` overrides any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [history]
//! capacity = 10             # Snapshots kept (undo depth is capacity - 1)
//!
//! [viewport]
//! max_zoom = 10.0
//! zoom_step = 0.1           # Zoom change per wheel notch
//! corner_radius = 15.0      # Canvas corner rounding, in canvas pixels
//! corner_points = 16        # Polygon points per rounded corner
//!
//! [animation]
//! duration_ms = 200
//! tick_ms = 10
//!
//! [interaction]
//! drag_interval_ms = 50     # At most one drag render per interval
//! wheel_debounce_ms = 50    # Wheel events closer than this are dropped
//!
//! [render]
//! timeout_ms = 5000         # Frames slower than this are reported as errors
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::viewport::ViewportSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub viewport: ViewportConfig,
    pub animation: AnimationConfig,
    pub interaction: InteractionConfig,
    pub render: RenderConfig,
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.capacity < 2 {
            return Err(ConfigError::Validation(
                "history.capacity must be at least 2".into(),
            ));
        }
        if !(self.viewport.max_zoom.is_finite() && self.viewport.max_zoom > 0.0) {
            return Err(ConfigError::Validation(
                "viewport.max_zoom must be positive".into(),
            ));
        }
        if !(self.viewport.zoom_step.is_finite() && self.viewport.zoom_step > 0.0) {
            return Err(ConfigError::Validation(
                "viewport.zoom_step must be positive".into(),
            ));
        }
        if self.viewport.corner_radius < 0.0 {
            return Err(ConfigError::Validation(
                "viewport.corner_radius must not be negative".into(),
            ));
        }
        if self.viewport.corner_points == 0 {
            return Err(ConfigError::Validation(
                "viewport.corner_points must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("animation.duration_ms", self.animation.duration_ms),
            ("animation.tick_ms", self.animation.tick_ms),
            ("render.timeout_ms", self.render.timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{key} must be positive")));
            }
        }
        Ok(())
    }

    /// Viewport tunables with durations resolved.
    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings {
            max_zoom: self.viewport.max_zoom,
            zoom_step: self.viewport.zoom_step,
            corner_radius: self.viewport.corner_radius,
            corner_points: self.viewport.corner_points,
            animation_duration: Duration::from_millis(self.animation.duration_ms),
            animation_tick: Duration::from_millis(self.animation.tick_ms),
            drag_interval: Duration::from_millis(self.interaction.drag_interval_ms),
            wheel_debounce: Duration::from_millis(self.interaction.wheel_debounce_ms),
            render_budget: Duration::from_millis(self.render.timeout_ms),
        }
    }
}

/// Undo history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Number of snapshots kept, including the current one.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: crate::history::DEFAULT_CAPACITY,
        }
    }
}

/// Zoom limits and canvas clipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    pub max_zoom: f64,
    /// Zoom change per wheel notch.
    pub zoom_step: f64,
    pub corner_radius: f64,
    /// Points generated per rounded corner.
    pub corner_points: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let stock = ViewportSettings::default();
        Self {
            max_zoom: stock.max_zoom,
            zoom_step: stock.zoom_step,
            corner_radius: stock.corner_radius,
            corner_points: stock.corner_points,
        }
    }
}

/// Zoom animation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub duration_ms: u64,
    pub tick_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            tick_ms: 10,
        }
    }
}

/// Rate limits for pointer input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    pub drag_interval_ms: u64,
    pub wheel_debounce_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_interval_ms: 50,
            wheel_debounce_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Frames slower than this fail with a timeout error.
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EditorConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    if overlay.is_some() {
        log::debug!("loaded config overrides from {}", dir.display());
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Retouch Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Undo history
# ---------------------------------------------------------------------------
[history]
# Snapshots kept, including the current one. Undo depth is capacity - 1.
capacity = 10

# ---------------------------------------------------------------------------
# Viewport
# ---------------------------------------------------------------------------
[viewport]
# Upper zoom limit. The lower limit is half the fit-to-canvas zoom.
max_zoom = 10.0
# Zoom change per wheel notch.
zoom_step = 0.1
# Canvas corner rounding, in canvas pixels.
corner_radius = 15.0
# Polygon points generated per rounded corner.
corner_points = 16

# ---------------------------------------------------------------------------
# Zoom animation
# ---------------------------------------------------------------------------
[animation]
duration_ms = 200
tick_ms = 10

# ---------------------------------------------------------------------------
# Pointer input
# ---------------------------------------------------------------------------
[interaction]
# At most one render per interval while dragging.
drag_interval_ms = 50
# Wheel events closer together than this are ignored.
wheel_debounce_ms = 50

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Frames slower than this are reported as a timeout.
timeout_ms = 5000

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
