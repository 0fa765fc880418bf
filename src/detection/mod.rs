pub mod annotate;
pub mod features;
pub mod geo;
pub mod heat;
pub mod linear;
mod pipeline;
pub mod preprocess;
pub mod regions;
mod scanner;
pub mod types;

pub use features::HogBackend;
pub use geo::{GeoFilter, GeoFilterConfig, LinearBound, PerspectiveBounds};
pub use linear::{LinearSvm, ModelArtifact, StandardScaler};
pub use pipeline::VehicleDetector;
pub use preprocess::NormalizedImage;
pub use scanner::{ScanOutput, WindowScanner};
pub use types::{
    BoundingBox, Classifier, DetectionResult, FeatureBackend, FeatureParams, Heatmap, LabelMap,
    ScaleSpec, Scaler,
};

use crate::config::DetectorConfig;
use crate::error::Result;
use std::path::Path;

/// Load a model artifact from `model_path` and build a detector around it.
pub fn create_default_detector(
    model_path: &Path,
    config: DetectorConfig,
) -> Result<VehicleDetector> {
    let artifact = ModelArtifact::load(model_path, config.window)?;
    VehicleDetector::from_artifact(config, artifact)
}
