use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::types::{Classifier, FeatureParams, Scaler};
use crate::error::{DetectError, Result};

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f32]) -> Vec<f32> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&m, &s))| {
                // Zero-variance features keep unit scale.
                let s = if s == 0.0 { 1.0 } else { s };
                (x - m) / s
            })
            .collect()
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.mean.len())
    }
}

/// Linear decision function: positive when `w · x + b > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    pub weights: Vec<f32>,
    pub intercept: f32,
}

impl LinearSvm {
    pub fn decision(&self, features: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.intercept
    }
}

impl Classifier for LinearSvm {
    fn predict(&self, features: &[f32]) -> bool {
        self.decision(features) > 0.0
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}

/// Trained classifier bundle: the model, its scaler and the feature
/// parameters it was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_params: FeatureParams,
    pub scaler: StandardScaler,
    pub classifier: LinearSvm,
}

impl ModelArtifact {
    /// Read and validate an artifact from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P, window: u32) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading model artifact from {}", path.display());

        let data = fs::read_to_string(path).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_str(&data).map_err(|source| DetectError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.validate(window)?;

        tracing::info!(
            features = artifact.classifier.weights.len(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    /// Check that every vector matches the feature layout implied by
    /// `feature_params` and a `window`-pixel window.
    pub fn validate(&self, window: u32) -> Result<()> {
        self.feature_params.validate(window)?;
        let expected = self.feature_params.feature_len(window);
        for (name, len) in [
            ("scaler.mean", self.scaler.mean.len()),
            ("scaler.scale", self.scaler.scale.len()),
            ("classifier.weights", self.classifier.weights.len()),
        ] {
            if len != expected {
                return Err(DetectError::IncompatibleArtifact(format!(
                    "{name} has {len} entries, feature parameters imply {expected}"
                )));
            }
        }
        let finite = self
            .scaler
            .mean
            .iter()
            .chain(&self.scaler.scale)
            .chain(&self.classifier.weights)
            .all(|v| v.is_finite())
            && self.classifier.intercept.is_finite();
        if !finite {
            return Err(DetectError::IncompatibleArtifact(
                "artifact contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tiny_params() -> FeatureParams {
        FeatureParams {
            orientations: 2,
            pixels_per_cell: 32,
            cells_per_block: 2,
            spatial_size: 2,
            hist_bins: 2,
        }
    }

    fn artifact(len: usize) -> ModelArtifact {
        ModelArtifact {
            feature_params: tiny_params(),
            scaler: StandardScaler {
                mean: vec![0.0; len],
                scale: vec![1.0; len],
            },
            classifier: LinearSvm {
                weights: vec![0.5; len],
                intercept: -1.0,
            },
        }
    }

    #[test]
    fn scaler_standardizes_and_guards_zero_scale() {
        let scaler = StandardScaler {
            mean: vec![1.0, 2.0, 3.0],
            scale: vec![2.0, 0.0, 0.5],
        };
        assert_eq!(scaler.transform(&[3.0, 5.0, 4.0]), vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn svm_sign_decides() {
        let svm = LinearSvm {
            weights: vec![1.0, -1.0],
            intercept: 0.5,
        };
        assert!(svm.predict(&[1.0, 1.0]));
        assert!(!svm.predict(&[0.0, 1.0]));
    }

    #[test]
    fn validate_checks_lengths_against_params() {
        // 2*2*3 spatial + 2*3 hist + 3 * 1 block * 8 gradient = 42
        let len = tiny_params().feature_len(64);
        assert_eq!(len, 42);
        assert!(artifact(len).validate(64).is_ok());
        assert!(matches!(
            artifact(len - 1).validate(64),
            Err(DetectError::IncompatibleArtifact(_))
        ));
    }

    #[test]
    fn load_round_trips_through_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&artifact(42)).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = ModelArtifact::load(file.path(), 64).unwrap();
        assert_eq!(loaded.feature_params, tiny_params());
        assert_eq!(loaded.classifier.weights.len(), 42);
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            ModelArtifact::load(file.path(), 64),
            Err(DetectError::Parse { .. })
        ));
    }
}
