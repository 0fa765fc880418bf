use vehicle_scan::{Classifier, Scaler};

pub struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn transform(&self, features: &[f32]) -> Vec<f32> {
        features.to_vec()
    }
}

/// Fires when every luma sample of the spatial features is bright, i.e. the
/// window lies entirely on a white region.
///
/// Relies on the spatial block coming first in the feature vector, with
/// channels interleaved and luma as channel 0.
pub struct BrightWindow {
    pub spatial_len: usize,
}

impl Classifier for BrightWindow {
    fn predict(&self, features: &[f32]) -> bool {
        features[..self.spatial_len]
            .iter()
            .step_by(3)
            .all(|&y| y > 0.5)
    }
}
