//! Settings and persisted preferences
//!
//! Preferences live in a small key-value [`PreferenceStore`]. The grid toggle
//! is stored as an int under `"GridStatus"`; everything else is one JSON blob.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SettingsError;
use crate::sim::{DrawMethod, GridConfig, WarpingGrid};

/// Key-value preference storage
pub trait PreferenceStore {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError>;
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Preferences kept in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::from(value));
        Ok(())
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::from(value));
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object, rewritten on every set
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::from(value));
        self.flush()
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::from(value));
        self.flush()
    }
}

/// Persisted on/off switch for the background grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStatus {
    enabled: bool,
}

impl Default for GridStatus {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl GridStatus {
    pub const KEY: &'static str = "GridStatus";

    /// Read the toggle; missing means enabled
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let enabled = store.get_int(Self::KEY).unwrap_or(1) != 0;
        log::info!("Grid {}", if enabled { "enabled" } else { "disabled" });
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Persist a new value and apply it to the grid
    pub fn set_grid_enabled(
        &mut self,
        enabled: bool,
        store: &mut dyn PreferenceStore,
        grid: &mut WarpingGrid,
    ) -> Result<(), SettingsError> {
        self.enabled = enabled;
        store.set_int(Self::KEY, i64::from(enabled))?;
        self.apply(grid);
        Ok(())
    }

    /// Build or tear down the grid to match. Call again on every scene load.
    pub fn apply(&self, grid: &mut WarpingGrid) {
        if self.enabled {
            grid.create_grid();
        } else {
            grid.disable_grid();
        }
    }
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool size for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }

    /// Smooth drawing only on High
    pub fn draw_method(&self) -> DrawMethod {
        match self {
            QualityPreset::Low | QualityPreset::Medium => DrawMethod::Quick,
            QualityPreset::High => DrawMethod::Smooth,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Picks particle capacity and grid draw method
    pub quality: QualityPreset,
    pub grid: GridConfig,
}

impl Settings {
    const STORAGE_KEY: &'static str = "warpfield_settings";

    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Default::default()
        }
    }

    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
    }

    pub fn max_particles(&self) -> usize {
        self.quality.max_particles()
    }

    /// Grid configuration with the preset's draw method
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            draw_method: self.quality.draw_method(),
            ..self.grid.clone()
        }
    }

    /// Load from the store, falling back to defaults
    pub fn load(store: &dyn PreferenceStore) -> Self {
        if let Some(json) = store.get_string(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn PreferenceStore) -> Result<(), SettingsError> {
        let json = serde_json::to_string(self)?;
        store.set_string(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
