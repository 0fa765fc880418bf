//! Single-frame vehicle detection.
//!
//! An image is scanned with a multi-scale sliding window, each window is
//! classified from gradient-histogram and color features, and overlapping
//! positives are merged through a vote heatmap into one box per vehicle.
//!
//! ```no_run
//! use std::path::Path;
//! use vehicle_scan::{create_default_detector, DetectorConfig, NormalizedImage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = create_default_detector(Path::new("model.json"), DetectorConfig::default())?;
//! let image = NormalizedImage::from_dynamic(&image::open("frame.png")?)?;
//! let result = detector.detect(&image)?;
//! for b in &result.boxes {
//!     println!("vehicle at ({}, {})-({}, {})", b.x1, b.y1, b.x2, b.y2);
//! }
//! # Ok(())
//! # }
//! ```
pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod output;

pub use crate::config::{load_config, DetectorConfig};
pub use crate::detection::{
    create_default_detector, BoundingBox, Classifier, DetectionResult, FeatureBackend,
    FeatureParams, ModelArtifact, NormalizedImage, ScaleSpec, Scaler, VehicleDetector,
};
pub use crate::error::{DetectError, Result};
