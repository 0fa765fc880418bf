use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::detection::{GeoFilterConfig, ScaleSpec};
use crate::error::{DetectError, Result};

/// Nominal classifier window side, in pixels of the resampled band.
pub const DEFAULT_WINDOW: u32 = 64;

/// Smallest accepted band scale. Smaller values upsample a band by more
/// than 4x and blow up the resampled buffer.
pub const MIN_SCALE: f32 = 0.25;

/// Search bands tuned for a 1280x720 forward-facing dash camera.
pub fn default_scale_table() -> Vec<ScaleSpec> {
    vec![
        ScaleSpec::new(400, 500, 1.0, 1),
        ScaleSpec::new(400, 600, 2.0, 1),
        ScaleSpec::new(500, 656, 2.0, 2),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub scale_table: Vec<ScaleSpec>,
    /// Heatmap cells with at most this many votes are dropped.
    pub heat_threshold: u32,
    /// Upper bound of the diagnostic heatmap.
    pub heat_clip: u32,
    pub geo: GeoFilterConfig,
    pub window: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_table: default_scale_table(),
            heat_threshold: 3,
            heat_clip: 255,
            geo: GeoFilterConfig::default(),
            window: DEFAULT_WINDOW,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(DetectError::InvalidConfig("window must be positive".to_string()));
        }
        if self.heat_clip == 0 {
            return Err(DetectError::InvalidConfig("heat_clip must be positive".to_string()));
        }
        if self.scale_table.is_empty() {
            return Err(DetectError::InvalidConfig("scale table is empty".to_string()));
        }
        for (i, spec) in self.scale_table.iter().enumerate() {
            if spec.y_start >= spec.y_stop {
                return Err(DetectError::InvalidConfig(format!(
                    "scale_table[{i}]: y_start {} must be below y_stop {}",
                    spec.y_start, spec.y_stop
                )));
            }
            if !spec.scale.is_finite() || spec.scale < MIN_SCALE {
                return Err(DetectError::InvalidConfig(format!(
                    "scale_table[{i}]: scale must be finite and at least {MIN_SCALE}, got {}",
                    spec.scale
                )));
            }
            if spec.cell_step == 0 {
                return Err(DetectError::InvalidConfig(format!(
                    "scale_table[{i}]: cell_step must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Load a JSON detector configuration; missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<DetectorConfig> {
    let data = fs::read_to_string(path).map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: DetectorConfig = serde_json::from_str(&data).map_err(|source| DetectError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}
