use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::ItemId;
use crate::portfolio::DEFAULT_OFFSET_PER_ITEM_KG;
use crate::telemetry::SensorReadings;

pub const BUILTIN_STOREFRONT_CONFIG: &str = include_str!("data/storefront_config.json");

/// Environment variable pointing at a JSON file that replaces the builtin config.
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub telemetry: TelemetryConfig,
    pub portfolio: PortfolioConfig,
    pub catalog: CatalogSourceConfig,
}

impl StorefrontConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_STOREFRONT_CONFIG)
                .expect("builtin storefront config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, StorefrontConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| StorefrontConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = StorefrontConfig::from_json_str(&contents)?;
        if let Some(base) = path.parent() {
            config.catalog.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_PATH_ENV`], or the builtin config when
    /// the variable is unset.
    pub fn from_env() -> Result<Arc<Self>, StorefrontConfigError> {
        match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Ok(Arc::new(Self::from_file(Path::new(&path))?)),
            None => Ok(Self::builtin()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorefrontConfigError {
    #[error("failed to parse storefront config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read storefront config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub handshake_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub camera_count: u8,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_step: f64,
    pub initial_readings: SensorReadings,
    pub temperature_jitter: f64,
    pub humidity_jitter: f64,
    pub light_jitter: f64,
    /// Fixed RNG seed for reproducible sensor walks; entropy when absent.
    pub seed: Option<u64>,
}

impl TelemetryConfig {
    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Number of whole zoom steps between the floor and the ceiling.
    pub fn zoom_steps(&self) -> u32 {
        if self.zoom_step <= 0.0 || self.zoom_max <= self.zoom_min {
            return 0;
        }
        ((self.zoom_max - self.zoom_min) / self.zoom_step).floor() as u32
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            handshake_delay_ms: 1200,
            tick_interval_ms: 2000,
            camera_count: 2,
            zoom_min: 1.0,
            zoom_max: 3.0,
            zoom_step: 0.5,
            initial_readings: SensorReadings {
                temperature_c: 24.2,
                humidity_pct: 65.0,
                light_lux: 850.0,
            },
            temperature_jitter: 0.1,
            humidity_jitter: 1.0,
            light_jitter: 5.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub default_owned: Vec<ItemId>,
    pub offset_per_item_kg: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            default_owned: vec![ItemId::new("1")],
            offset_per_item_kg: DEFAULT_OFFSET_PER_ITEM_KG,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSourceConfig {
    /// Catalog JSON replacing the builtin seed data. Relative paths in a
    /// config file are taken from the file's directory.
    pub path: Option<PathBuf>,
}

impl CatalogSourceConfig {
    pub fn resolve_relative_to(&mut self, base: &Path) {
        if let Some(path) = self.path.as_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
