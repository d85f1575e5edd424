use codecanvas_core::{MAX_CANVAS_SCALE, MIN_CANVAS_SCALE, clamp_scale};
use codecanvas_graph::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub resolve_timeout_ms: u64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub wheel_scroll_debounce_ms: u64,
    pub zoom_sensitivity: f64,
    pub pinch_zoom_sensitivity: f64,
    pub keyboard_nudge: f64,
    pub keyboard_nudge_fast: f64,
    pub glide_duration_ms: u64,
    pub viewport_padding: f64,
    /// A pending undo batch idle for longer than this is sealed before the
    /// next mutation joins it. Zero disables auto-commit.
    pub auto_commit_ms: u64,
    pub max_history: usize,
    pub open_dependency_gap: f64,
    pub cull_margin: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: 20_000,
            min_scale: MIN_CANVAS_SCALE,
            max_scale: MAX_CANVAS_SCALE,
            wheel_scroll_debounce_ms: 300,
            zoom_sensitivity: 0.001,
            pinch_zoom_sensitivity: 0.01,
            keyboard_nudge: 5.0,
            keyboard_nudge_fast: 25.0,
            glide_duration_ms: 250,
            viewport_padding: 25.0,
            auto_commit_ms: 250,
            max_history: 100,
            open_dependency_gap: 60.0,
            cull_margin: 100.0,
        }
    }
}

impl CanvasSettings {
    /// Reads settings from a JSON file. A missing file yields the defaults;
    /// missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        tracing::info!("Loaded canvas settings from {:?}", path);
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Zoom range, always inside the hard camera limits.
    pub fn scale_range(&self) -> (f64, f64) {
        let min = clamp_scale(self.min_scale);
        let max = clamp_scale(self.max_scale);
        if min <= max { (min, max) } else { (max, min) }
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        let (min, max) = self.scale_range();
        clamp_scale(scale).clamp(min, max)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn wheel_debounce(&self) -> Duration {
        Duration::from_millis(self.wheel_scroll_debounce_ms)
    }

    pub fn glide_duration(&self) -> Duration {
        Duration::from_millis(self.glide_duration_ms)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_history: self.max_history,
            auto_commit: (self.auto_commit_ms > 0).then(|| Duration::from_millis(self.auto_commit_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = CanvasSettings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, CanvasSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "glide_duration_ms": 0, "cull_margin": 12.5 }"#).unwrap();

        let settings = CanvasSettings::load(&path).unwrap();
        assert_eq!(settings.glide_duration_ms, 0);
        assert_eq!(settings.cull_margin, 12.5);
        assert_eq!(settings.resolve_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("canvas.json");
        let settings = CanvasSettings {
            keyboard_nudge: 8.0,
            ..CanvasSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(CanvasSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(CanvasSettings::load(&path), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_scale_range_stays_inside_hard_limits() {
        let settings = CanvasSettings {
            min_scale: 0.01,
            max_scale: 9.0,
            ..CanvasSettings::default()
        };
        assert_eq!(settings.scale_range(), (MIN_CANVAS_SCALE, MAX_CANVAS_SCALE));

        let narrow = CanvasSettings {
            min_scale: 1.5,
            max_scale: 0.5,
            ..CanvasSettings::default()
        };
        assert_eq!(narrow.clamp_scale(1.9), 1.5);
        assert_eq!(narrow.clamp_scale(0.1), 0.5);
    }

    #[test]
    fn test_zero_auto_commit_disables_it() {
        let settings = CanvasSettings {
            auto_commit_ms: 0,
            ..CanvasSettings::default()
        };
        assert_eq!(settings.pipeline_config().auto_commit, None);
        assert_eq!(settings.pipeline_config().max_history, 100);
    }
}
