use image::{Rgb32FImage, RgbImage};
use ndarray::{Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Per-pixel vote count, indexed `[[y, x]]`.
pub type Heatmap = Array2<u32>;

/// Connected-component labels, indexed `[[y, x]]`. 0 is background.
pub type LabelMap = Array2<u32>;

/// Axis-aligned box in original-image pixel coordinates.
///
/// Corners are top-left `(x1, y1)` and bottom-right `(x2, y2)`; the box covers
/// the half-open pixel range `[x1, x2) × [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Reorder corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// One horizontal search band: rows `[y_start, y_stop)` resampled by `1 / scale`
/// and scanned with a stride of `cell_step` cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub y_start: u32,
    pub y_stop: u32,
    pub scale: f32,
    pub cell_step: usize,
}

impl ScaleSpec {
    pub fn new(y_start: u32, y_stop: u32, scale: f32, cell_step: usize) -> Self {
        Self {
            y_start,
            y_stop,
            scale,
            cell_step,
        }
    }
}

/// Feature extraction parameters. These must match the values the classifier
/// was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureParams {
    pub orientations: usize,
    pub pixels_per_cell: usize,
    pub cells_per_block: usize,
    pub spatial_size: u32,
    pub hist_bins: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            orientations: 9,
            pixels_per_cell: 8,
            cells_per_block: 2,
            spatial_size: 32,
            hist_bins: 32,
        }
    }
}

impl FeatureParams {
    /// Number of gradient blocks spanned by a window of `window` pixels.
    pub fn blocks_per_window(&self, window: u32) -> usize {
        (window as usize / self.pixels_per_cell.max(1)).saturating_sub(self.cells_per_block) + 1
    }

    /// Block count along one axis of `extent` pixels, zero when the axis is
    /// shorter than one block.
    pub fn blocks_along(&self, extent: usize) -> usize {
        let cells = extent / self.pixels_per_cell.max(1);
        if cells < self.cells_per_block {
            0
        } else {
            cells - self.cells_per_block + 1
        }
    }

    pub fn features_per_block(&self) -> usize {
        self.orientations * self.cells_per_block * self.cells_per_block
    }

    pub fn spatial_len(&self) -> usize {
        (self.spatial_size * self.spatial_size) as usize * 3
    }

    pub fn histogram_len(&self) -> usize {
        self.hist_bins * 3
    }

    pub fn gradient_len(&self, window: u32) -> usize {
        let span = self.blocks_per_window(window);
        3 * span * span * self.features_per_block()
    }

    /// Length of the assembled `[spatial, histogram, gradient]` vector.
    pub fn feature_len(&self, window: u32) -> usize {
        self.spatial_len() + self.histogram_len() + self.gradient_len(window)
    }

    pub fn validate(&self, window: u32) -> Result<()> {
        if self.orientations == 0 || self.pixels_per_cell == 0 || self.cells_per_block == 0 {
            return Err(DetectError::IncompatibleArtifact(format!(
                "orientations, pixels_per_cell and cells_per_block must be positive, got {:?}",
                self
            )));
        }
        if self.hist_bins == 0 {
            return Err(DetectError::IncompatibleArtifact(
                "hist_bins must be positive".to_string(),
            ));
        }
        if self.spatial_size == 0 || self.spatial_size > window {
            return Err(DetectError::IncompatibleArtifact(format!(
                "spatial_size must be in 1..={window}, got {}",
                self.spatial_size
            )));
        }
        let cells = window as usize / self.pixels_per_cell;
        if window as usize % self.pixels_per_cell != 0 || cells < self.cells_per_block {
            return Err(DetectError::IncompatibleArtifact(format!(
                "a {window}px window does not tile into {}px cells with {}-cell blocks",
                self.pixels_per_cell, self.cells_per_block
            )));
        }
        Ok(())
    }
}

/// Binary window classifier.
///
/// Implementations are shared read-only across images and must not carry
/// hidden mutable state.
pub trait Classifier: Send + Sync {
    /// `true` when the (already scaled) feature vector is a vehicle.
    fn predict(&self, features: &[f32]) -> bool;

    /// Expected feature vector length, if known.
    fn input_len(&self) -> Option<usize> {
        None
    }
}

/// Feature normalization applied before [`Classifier::predict`].
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &[f32]) -> Vec<f32>;

    fn input_len(&self) -> Option<usize> {
        None
    }
}

/// Low-level feature primitives used by the window scanner.
pub trait FeatureBackend: Send + Sync {
    /// Dense gradient-histogram blocks over a whole channel, shaped
    /// `(n_blocks_y, n_blocks_x, features_per_block)`.
    fn gradient_blocks(&self, channel: ArrayView2<'_, f32>, params: &FeatureParams) -> Array3<f32>;

    /// Patch resized to `size × size`, flattened row-major with channels
    /// interleaved.
    fn spatial_features(&self, patch: &Rgb32FImage, size: u32) -> Vec<f32>;

    /// Per-channel histograms over `[0, 1]`, channel 0 first.
    fn color_histogram(&self, patch: &Rgb32FImage, bins: usize) -> Vec<f32>;
}

/// Final per-image output.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Consolidated boxes, in region label order.
    pub boxes: Vec<BoundingBox>,
    /// Raw scanner detections that fed the heatmap.
    pub raw_boxes: Vec<BoundingBox>,
    /// Thresholded and clipped heatmap.
    pub heatmap: Heatmap,
    /// Input image with the raw detections drawn on it.
    pub annotated: RgbImage,
}
