use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::speech::DistanceUnit;

/// Tunables for the detection pipeline. The reference values live in
/// `Default`; everything is runtime configuration here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Readings closer than this count as obstacles (meters).
    pub threshold_m: f32,
    /// Fraction of the frame width covered by the region of interest.
    pub roi_width_ratio: f32,
    /// Fraction of the frame height covered by the region of interest.
    pub roi_height_ratio: f32,
    /// Detection cycle period, independent of the frame delivery rate.
    pub tick_interval_ms: u64,
    /// Upper bound on one background scan before the cycle is abandoned.
    pub scan_timeout_ms: u64,
    /// Unit used for spoken distances.
    pub distance_unit: DistanceUnit,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_m: 0.5,
            roi_width_ratio: 0.3,
            roi_height_ratio: 0.3,
            tick_interval_ms: 200,
            scan_timeout_ms: 1000,
            distance_unit: DistanceUnit::Meters,
        }
    }
}

impl PipelineConfig {
    /// Same bounds the detector enforces per call, checked once up front so a
    /// bad config file fails loudly at startup instead of every tick.
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [
            ("roiWidthRatio", self.roi_width_ratio),
            ("roiHeightRatio", self.roi_height_ratio),
        ] {
            if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
                bail!("{name} {ratio} is outside (0, 1]");
            }
        }
        if !self.threshold_m.is_finite() || self.threshold_m <= 0.0 {
            bail!("thresholdM {} must be positive and finite", self.threshold_m);
        }
        if self.tick_interval_ms == 0 {
            bail!("tickIntervalMs must be greater than zero");
        }
        if self.scan_timeout_ms == 0 {
            bail!("scanTimeoutMs must be greater than zero");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    pipeline: PipelineConfig,
    speech_muted: bool,
}

/// JSON-backed settings, loaded once and updated through the store. A missing
/// or malformed file falls back to defaults rather than blocking startup.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        self.data.read().unwrap().pipeline.clone()
    }

    pub fn speech_muted(&self) -> bool {
        self.data.read().unwrap().speech_muted
    }

    pub fn update_pipeline(&self, config: PipelineConfig) -> Result<()> {
        config.validate()?;
        let mut guard = self.data.write().unwrap();
        guard.pipeline = config;
        self.persist(&guard)
    }

    pub fn set_speech_muted(&self, muted: bool) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.speech_muted = muted;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// Debug switches via environment, e.g. more chatty cycle logging.
pub fn debug_enabled() -> bool {
    std::env::var("PATHSENSE_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_what_detect_rejects() {
        let mut config = PipelineConfig::default();
        config.roi_width_ratio = 0.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.roi_height_ratio = 1.01;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.threshold_m = -0.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn settings_round_trip() {
        let dir = std::env::temp_dir().join("pathsense-config-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.pipeline(), PipelineConfig::default());

        let mut config = store.pipeline();
        config.threshold_m = 0.8;
        store.update_pipeline(config.clone()).unwrap();

        let reloaded = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.pipeline(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() {
        let dir = std::env::temp_dir().join("pathsense-config-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.pipeline(), PipelineConfig::default());
        let _ = fs::remove_file(&path);
    }
}
