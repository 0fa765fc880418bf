use std::sync::Arc;

use super::features::HogBackend;
use super::geo::GeoFilter;
use super::heat::accumulate;
use super::linear::ModelArtifact;
use super::preprocess::NormalizedImage;
use super::regions::extract;
use super::scanner::WindowScanner;
use super::types::{Classifier, DetectionResult, FeatureBackend, FeatureParams, Scaler};
use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};

/// Single-frame vehicle detector: scan, accumulate heat, extract regions.
///
/// Holds only immutable state, so one instance can serve many images,
/// including from several threads at once.
pub struct VehicleDetector {
    config: DetectorConfig,
    params: FeatureParams,
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn Classifier>,
    backend: Box<dyn FeatureBackend>,
    geo: GeoFilter,
}

impl VehicleDetector {
    /// Build a detector, validating the configuration and the classifier's
    /// feature layout before any image is scanned.
    pub fn new(
        config: DetectorConfig,
        params: FeatureParams,
        scaler: Arc<dyn Scaler>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        config.validate()?;
        params.validate(config.window)?;

        let expected = params.feature_len(config.window);
        for (name, len) in [
            ("scaler", scaler.input_len()),
            ("classifier", classifier.input_len()),
        ] {
            if let Some(len) = len {
                if len != expected {
                    return Err(DetectError::IncompatibleArtifact(format!(
                        "{name} expects {len} features, scanner produces {expected}"
                    )));
                }
            }
        }

        let geo = GeoFilter::new(config.geo);
        Ok(Self {
            config,
            params,
            scaler,
            classifier,
            backend: Box::new(HogBackend::new()),
            geo,
        })
    }

    pub fn from_artifact(config: DetectorConfig, artifact: ModelArtifact) -> Result<Self> {
        artifact.validate(config.window)?;
        let ModelArtifact {
            feature_params,
            scaler,
            classifier,
        } = artifact;
        Self::new(config, feature_params, Arc::new(scaler), Arc::new(classifier))
    }

    /// Replace the default gradient-histogram backend.
    pub fn with_backend(mut self, backend: Box<dyn FeatureBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn detect(&self, image: &NormalizedImage) -> Result<DetectionResult> {
        let _span = tracing::debug_span!("detect", w = image.width(), h = image.height()).entered();

        let scanner = WindowScanner::new(
            self.backend.as_ref(),
            self.scaler.as_ref(),
            self.classifier.as_ref(),
            self.params,
            &self.geo,
            self.config.window,
        );
        let scan = scanner.scan(image, &self.config.scale_table)?;

        let shape = (image.height() as usize, image.width() as usize);
        let heat = {
            let _span = tracing::debug_span!("accumulate").entered();
            accumulate(&scan.boxes, shape)
        };
        let (boxes, heatmap) = extract(
            heat,
            self.config.heat_threshold,
            self.config.heat_clip,
            &self.geo,
        );

        tracing::debug!(raw = scan.boxes.len(), kept = boxes.len(), "detection finished");
        Ok(DetectionResult {
            boxes,
            raw_boxes: scan.boxes,
            heatmap,
            annotated: scan.annotated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::linear::{LinearSvm, StandardScaler};

    fn artifact(len: usize) -> ModelArtifact {
        ModelArtifact {
            feature_params: FeatureParams::default(),
            scaler: StandardScaler {
                mean: vec![0.0; len],
                scale: vec![1.0; len],
            },
            classifier: LinearSvm {
                weights: vec![0.0; len],
                intercept: -1.0,
            },
        }
    }

    #[test]
    fn mismatched_classifier_is_rejected_up_front() {
        let len = FeatureParams::default().feature_len(64);
        let result = VehicleDetector::new(
            DetectorConfig::default(),
            FeatureParams::default(),
            Arc::new(artifact(len).scaler),
            Arc::new(artifact(len + 3).classifier),
        );
        assert!(matches!(result, Err(DetectError::IncompatibleArtifact(_))));
    }

    #[test]
    fn silent_model_produces_empty_result() {
        let len = FeatureParams::default().feature_len(64);
        let detector =
            VehicleDetector::from_artifact(DetectorConfig::default(), artifact(len)).unwrap();
        let pixels = ndarray::Array3::<u8>::from_elem((720, 1280, 3), 90);
        let image = NormalizedImage::from_u8(pixels.view()).unwrap();

        let result = detector.detect(&image).unwrap();
        assert!(result.boxes.is_empty());
        assert!(result.raw_boxes.is_empty());
        assert_eq!(result.heatmap.dim(), (720, 1280));
        assert_eq!(result.annotated.dimensions(), (1280, 720));
    }

    /// Reports every patch as bright, whatever the pixels say.
    struct BrightBackend;

    impl FeatureBackend for BrightBackend {
        fn gradient_blocks(
            &self,
            channel: ndarray::ArrayView2<'_, f32>,
            params: &FeatureParams,
        ) -> ndarray::Array3<f32> {
            let (h, w) = channel.dim();
            ndarray::Array3::zeros((
                params.blocks_along(h),
                params.blocks_along(w),
                params.features_per_block(),
            ))
        }

        fn spatial_features(&self, _patch: &image::Rgb32FImage, size: u32) -> Vec<f32> {
            vec![1.0; (size * size * 3) as usize]
        }

        fn color_histogram(&self, _patch: &image::Rgb32FImage, bins: usize) -> Vec<f32> {
            vec![0.0; bins * 3]
        }
    }

    struct FirstFeature;

    impl Classifier for FirstFeature {
        fn predict(&self, features: &[f32]) -> bool {
            features[0] > 0.5
        }
    }

    #[test]
    fn custom_backend_replaces_hog() {
        let config = DetectorConfig {
            scale_table: vec![crate::detection::ScaleSpec::new(0, 64, 1.0, 1)],
            geo: crate::detection::GeoFilterConfig {
                perspective: None,
                ..Default::default()
            },
            heat_threshold: 0,
            ..Default::default()
        };
        let len = FeatureParams::default().feature_len(64);
        let detector = VehicleDetector::new(
            config,
            FeatureParams::default(),
            Arc::new(artifact(len).scaler),
            Arc::new(FirstFeature),
        )
        .unwrap()
        .with_backend(Box::new(BrightBackend));
        assert_eq!(detector.config().heat_threshold, 0);

        let pixels = ndarray::Array3::<u8>::zeros((64, 64, 3));
        let result = detector
            .detect(&NormalizedImage::from_u8(pixels.view()).unwrap())
            .unwrap();
        assert_eq!(result.raw_boxes, vec![crate::detection::BoundingBox::new(0, 0, 64, 64)]);
        assert_eq!(result.boxes, result.raw_boxes);
    }
}
