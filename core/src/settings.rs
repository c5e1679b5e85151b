//! Editor settings loaded from `settings.toml`.
//!
//! Settings are grouped into `[editor]`, `[view]` and `[map]` tables with
//! kebab-case keys. Missing tables or keys fall back to built-in defaults,
//! so an empty file is a valid configuration.
//!
//! Tools read individual values through the dotted-key lookup
//! [`Settings::value`], e.g. `settings.value("editor.snap-radius")`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or changing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown setting \"{0}\"")]
    UnknownKey(String),
    #[error("setting \"{key}\" expects a {expected} value")]
    TypeMismatch { key: String, expected: &'static str },
}

/// A single setting value as returned by [`Settings::value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(u32),
    Float(f32),
}

impl SettingValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f32`.
    pub fn as_f32(self) -> Option<f32> {
        match self {
            Self::Int(i) => Some(i as f32),
            Self::Float(f) => Some(f),
            Self::Bool(_) => None,
        }
    }

    pub fn as_u32(self) -> Option<u32> {
        match self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Interaction settings: grid, zoom, history, handles, snapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EditorSettings {
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub grid_limit: f32,
    pub zoom_factor: f32,
    pub zoom_max: f32,
    pub zoom_min: f32,
    pub undo_limit: u32,
    pub drag_threshold: f32,
    pub vertex_size: f32,
    pub waypoint_size: f32,
    pub snap_radius: f32,
    pub snap_to_grid: bool,
    pub snap_to_objects: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: 100.0,
            grid_divisions: 5,
            grid_limit: 10.0,
            zoom_factor: 1.25,
            zoom_max: 16.0,
            zoom_min: 1.0 / 16.0,
            undo_limit: 100,
            drag_threshold: 5.0,
            vertex_size: 7.0,
            waypoint_size: 11.0,
            snap_radius: 5.0,
            snap_to_grid: true,
            snap_to_objects: true,
        }
    }
}

impl EditorSettings {
    /// Zoom limits as `(min, max)`. A NaN bound falls back to its default,
    /// and reversed bounds are swapped.
    pub fn zoom_bounds(&self) -> (f32, f32) {
        let defaults = Self::default();
        let min = if self.zoom_min.is_nan() { defaults.zoom_min } else { self.zoom_min };
        let max = if self.zoom_max.is_nan() { defaults.zoom_max } else { self.zoom_max };
        (min.min(max), min.max(max))
    }
}

/// Display toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ViewSettings {
    pub grid: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self { grid: true }
    }
}

/// Defaults for newly created map content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MapSettings {
    pub collider_radius: f32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            collider_radius: 8.0,
        }
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub editor: EditorSettings,
    pub view: ViewSettings,
    pub map: MapSettings,
}

macro_rules! setting_keys {
    ($($key:literal => $section:ident . $field:ident : $kind:ident),* $(,)?) => {
        impl Settings {
            /// Every dotted key understood by [`value`](Self::value), in table order.
            pub const KEYS: &'static [&'static str] = &[$($key),*];

            /// Looks up a setting by its dotted key (`"editor.snap-radius"`).
            ///
            /// Returns `None` for unknown keys.
            pub fn value(&self, key: &str) -> Option<SettingValue> {
                match key {
                    $($key => Some(SettingValue::$kind(self.$section.$field)),)*
                    _ => None,
                }
            }

            /// Changes a setting by its dotted key.
            ///
            /// Returns `Ok(false)` if the value is unchanged.
            pub fn set(&mut self, key: &str, value: SettingValue) -> Result<bool, SettingsError> {
                match key {
                    $($key => {
                        let SettingValue::$kind(v) = value else {
                            return Err(SettingsError::TypeMismatch {
                                key: key.to_string(),
                                expected: SettingValue::$kind(Default::default()).kind(),
                            });
                        };
                        if self.$section.$field == v {
                            return Ok(false);
                        }
                        self.$section.$field = v;
                        Ok(true)
                    })*
                    _ => Err(SettingsError::UnknownKey(key.to_string())),
                }
            }
        }
    };
}

setting_keys! {
    "editor.grid-size" => editor.grid_size: Float,
    "editor.grid-divisions" => editor.grid_divisions: Int,
    "editor.grid-limit" => editor.grid_limit: Float,
    "editor.zoom-factor" => editor.zoom_factor: Float,
    "editor.zoom-max" => editor.zoom_max: Float,
    "editor.zoom-min" => editor.zoom_min: Float,
    "editor.undo-limit" => editor.undo_limit: Int,
    "editor.drag-threshold" => editor.drag_threshold: Float,
    "editor.vertex-size" => editor.vertex_size: Float,
    "editor.waypoint-size" => editor.waypoint_size: Float,
    "editor.snap-radius" => editor.snap_radius: Float,
    "editor.snap-to-grid" => editor.snap_to_grid: Bool,
    "editor.snap-to-objects" => editor.snap_to_objects: Bool,
    "view.grid" => view.grid: Bool,
    "map.collider-radius" => map.collider_radius: Float,
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Load settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load settings, falling back to defaults if the file is missing or invalid.
pub fn load_or_default(path: &Path) -> Settings {
    match load_settings(path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::warn!("Using default settings: {e}");
            Settings::default()
        }
    }
}
