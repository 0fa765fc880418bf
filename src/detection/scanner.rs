use image::{Rgb32FImage, RgbImage};
use ndarray::{s, Array3};

use super::annotate::{draw_boxes, to_rgb8, BOX_COLOR};
use super::geo::GeoFilter;
use super::preprocess::{
    as_array, channel, crop_rows, resize, rgb_to_ycrcb, scaled_dimensions, NormalizedImage,
};
use super::types::{BoundingBox, Classifier, FeatureBackend, FeatureParams, ScaleSpec, Scaler};
use crate::error::{DetectError, Result};

/// Raw scan output: the input with every accepted detection drawn on it and
/// the detections themselves.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub annotated: RgbImage,
    pub boxes: Vec<BoundingBox>,
}

/// Multi-scale sliding-window scanner.
///
/// Gradient blocks are computed once per band and channel; each window then
/// slices its block span out of the precomputed grid.
pub struct WindowScanner<'a> {
    backend: &'a dyn FeatureBackend,
    scaler: &'a dyn Scaler,
    classifier: &'a dyn Classifier,
    params: FeatureParams,
    geo: &'a GeoFilter,
    window: u32,
}

impl<'a> WindowScanner<'a> {
    pub fn new(
        backend: &'a dyn FeatureBackend,
        scaler: &'a dyn Scaler,
        classifier: &'a dyn Classifier,
        params: FeatureParams,
        geo: &'a GeoFilter,
        window: u32,
    ) -> Self {
        Self {
            backend,
            scaler,
            classifier,
            params,
            geo,
            window,
        }
    }

    pub fn scan(&self, image: &NormalizedImage, scale_table: &[ScaleSpec]) -> Result<ScanOutput> {
        let _span = tracing::debug_span!("scan").entered();

        let mut boxes = Vec::new();
        for spec in scale_table {
            self.scan_band(image, spec, &mut boxes)?;
        }

        let mut annotated = to_rgb8(image.as_rgb());
        draw_boxes(&mut annotated, &boxes, BOX_COLOR);
        Ok(ScanOutput { annotated, boxes })
    }

    fn scan_band(
        &self,
        image: &NormalizedImage,
        spec: &ScaleSpec,
        boxes: &mut Vec<BoundingBox>,
    ) -> Result<()> {
        let _span =
            tracing::debug_span!("band", y_start = spec.y_start, scale = spec.scale).entered();

        let height = image.height();
        let y_stop = spec.y_stop.min(height);
        if spec.y_start >= y_stop {
            return Err(DetectError::InvalidBand {
                y_start: spec.y_start,
                y_stop: spec.y_stop,
                height,
            });
        }

        let band = rgb_to_ycrcb(&crop_rows(image.as_rgb(), spec.y_start, y_stop));
        let band = if spec.scale != 1.0 {
            let (w, h) = scaled_dimensions(band.width(), band.height(), spec.scale);
            if w == 0 || h == 0 {
                tracing::debug!("band resamples to nothing, skipping");
                return Ok(());
            }
            resize(&band, w, h)
        } else {
            band
        };

        let p = &self.params;
        let nx_blocks = p.blocks_along(band.width() as usize);
        let ny_blocks = p.blocks_along(band.height() as usize);
        let span = p.blocks_per_window(self.window);
        if nx_blocks < span || ny_blocks < span {
            tracing::debug!(nx_blocks, ny_blocks, span, "band smaller than one window");
            return Ok(());
        }
        let step = spec.cell_step.max(1);
        let nx_steps = (nx_blocks - span) / step + 1;
        let ny_steps = (ny_blocks - span) / step + 1;

        let pixels = as_array(&band)?;
        let grads: Vec<Array3<f32>> = (0..3)
            .map(|c| self.backend.gradient_blocks(channel(pixels, c), p))
            .collect();

        let mut features = Vec::with_capacity(p.feature_len(self.window));
        let mut positives = 0usize;
        for xb in 0..nx_steps {
            for yb in 0..ny_steps {
                let xpos = xb * step;
                let ypos = yb * step;
                let xleft = (xpos * p.pixels_per_cell) as u32;
                let ytop = (ypos * p.pixels_per_cell) as u32;

                features.clear();
                let patch = self.patch(&band, xleft, ytop);
                features.extend(self.backend.spatial_features(&patch, p.spatial_size));
                features.extend(self.backend.color_histogram(&patch, p.hist_bins));
                for blocks in &grads {
                    features.extend(
                        blocks
                            .slice(s![ypos..ypos + span, xpos..xpos + span, ..])
                            .iter()
                            .copied(),
                    );
                }

                let scaled = self.scaler.transform(&features);
                if !self.classifier.predict(&scaled) {
                    continue;
                }
                positives += 1;

                let b = self.window_to_image(xleft, ytop, spec);
                if self.geo.accepts(&b) {
                    boxes.push(b);
                } else {
                    tracing::trace!(?b, "rejected by perspective bound");
                }
            }
        }

        tracing::debug!(windows = nx_steps * ny_steps, positives, "band scanned");
        Ok(())
    }

    /// `window × window` pixel patch at `(xleft, ytop)` of the resampled band.
    fn patch(&self, band: &Rgb32FImage, xleft: u32, ytop: u32) -> Rgb32FImage {
        let w = self.window.min(band.width() - xleft);
        let h = self.window.min(band.height() - ytop);
        let sub = image::imageops::crop_imm(band, xleft, ytop, w, h).to_image();
        resize(&sub, self.window, self.window)
    }

    /// Map a window in the resampled band back to original-image pixels.
    fn window_to_image(&self, xleft: u32, ytop: u32, spec: &ScaleSpec) -> BoundingBox {
        let x1 = (xleft as f32 * spec.scale) as i32;
        let y1 = (ytop as f32 * spec.scale) as i32 + spec.y_start as i32;
        let side = (self.window as f32 * spec.scale) as i32;
        BoundingBox::new(x1, y1, x1 + side, y1 + side)
    }
}
