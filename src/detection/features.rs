//! Default feature primitives: histogram of oriented gradients, spatial
//! binning and per-channel color histograms.
//!
//! Gradients use centered differences (forward/backward at the border),
//! orientations are unsigned in `[0°, 180°)` and votes are hard-assigned to
//! the nearest-lower bin, weighted by magnitude and averaged over the cell.
//! Blocks are L2-Hys normalized.
use image::Rgb32FImage;
use ndarray::{Array2, Array3, ArrayView2};

use super::preprocess::resize;
use super::types::{FeatureBackend, FeatureParams};

const L2HYS_CLIP: f32 = 0.2;
const EPS: f32 = 1e-5;

#[derive(Debug, Clone, Copy, Default)]
pub struct HogBackend;

impl HogBackend {
    pub fn new() -> Self {
        Self
    }

    /// Per-cell orientation histograms, shaped `(cells_y, cells_x, orientations)`.
    fn cell_histograms(&self, channel: ArrayView2<'_, f32>, params: &FeatureParams) -> Array3<f32> {
        let (h, w) = channel.dim();
        let ppc = params.pixels_per_cell;
        let (cells_y, cells_x) = (h / ppc, w / ppc);
        let bins = params.orientations;
        let mut hist = Array3::<f32>::zeros((cells_y, cells_x, bins));
        if cells_x == 0 || cells_y == 0 {
            return hist;
        }

        let (mag, ori) = gradients(channel);
        let bin_width = 180.0 / bins as f32;
        for y in 0..cells_y * ppc {
            for x in 0..cells_x * ppc {
                let bin = ((ori[[y, x]] / bin_width) as usize).min(bins - 1);
                hist[[y / ppc, x / ppc, bin]] += mag[[y, x]];
            }
        }
        let area = (ppc * ppc) as f32;
        hist.mapv_inplace(|v| v / area);
        hist
    }
}

impl FeatureBackend for HogBackend {
    fn gradient_blocks(&self, channel: ArrayView2<'_, f32>, params: &FeatureParams) -> Array3<f32> {
        let _span = tracing::trace_span!("hog").entered();

        let cells = self.cell_histograms(channel, params);
        let (h, w) = channel.dim();
        let nby = params.blocks_along(h);
        let nbx = params.blocks_along(w);
        let cpb = params.cells_per_block;
        let bins = params.orientations;
        let mut blocks = Array3::<f32>::zeros((nby, nbx, params.features_per_block()));

        for by in 0..nby {
            for bx in 0..nbx {
                let mut block = Vec::with_capacity(params.features_per_block());
                for cy in 0..cpb {
                    for cx in 0..cpb {
                        for o in 0..bins {
                            block.push(cells[[by + cy, bx + cx, o]]);
                        }
                    }
                }
                l2hys(&mut block);
                for (i, v) in block.into_iter().enumerate() {
                    blocks[[by, bx, i]] = v;
                }
            }
        }
        blocks
    }

    fn spatial_features(&self, patch: &Rgb32FImage, size: u32) -> Vec<f32> {
        resize(patch, size, size).into_raw()
    }

    fn color_histogram(&self, patch: &Rgb32FImage, bins: usize) -> Vec<f32> {
        let mut hist = vec![0.0f32; bins * 3];
        for px in patch.pixels() {
            for (c, &v) in px.0.iter().enumerate() {
                let bin = ((v.clamp(0.0, 1.0) * bins as f32) as usize).min(bins - 1);
                hist[c * bins + bin] += 1.0;
            }
        }
        hist
    }
}

/// Gradient magnitude and unsigned orientation in degrees.
fn gradients(channel: ArrayView2<'_, f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = channel.dim();
    let mut mag = Array2::<f32>::zeros((h, w));
    let mut ori = Array2::<f32>::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let gx = if w < 2 {
                0.0
            } else {
                channel[[y, (x + 1).min(w - 1)]] - channel[[y, x.saturating_sub(1)]]
            };
            let gy = if h < 2 {
                0.0
            } else {
                channel[[(y + 1).min(h - 1), x]] - channel[[y.saturating_sub(1), x]]
            };
            mag[[y, x]] = (gx * gx + gy * gy).sqrt();
            let mut angle = gy.atan2(gx).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            if angle >= 180.0 {
                angle -= 180.0;
            }
            ori[[y, x]] = angle;
        }
    }
    (mag, ori)
}

fn l2hys(block: &mut [f32]) {
    normalize_l2(block);
    for v in block.iter_mut() {
        *v = v.min(L2HYS_CLIP);
    }
    normalize_l2(block);
}

fn normalize_l2(block: &mut [f32]) {
    let norm = (block.iter().map(|v| v * v).sum::<f32>() + EPS * EPS).sqrt();
    for v in block.iter_mut() {
        *v /= norm;
    }
}
