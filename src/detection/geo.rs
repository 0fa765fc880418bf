use serde::{Deserialize, Serialize};

use super::types::BoundingBox;

/// A line through `(x, y)` with `slope` pixels of x per pixel of y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearBound {
    pub x: f32,
    pub y: f32,
    pub slope: f32,
}

/// Perspective plausibility region for raw detections.
///
/// A box is kept when its top-left corner lies right of `left` and its
/// bottom-right corner lies left of `right`:
///
/// ```text
/// x1 >= left.x  + (left.y - y1)  * left.slope
/// x2 <= right.x + (y2 - right.y) * right.slope
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveBounds {
    pub left: LinearBound,
    pub right: LinearBound,
}

impl Default for PerspectiveBounds {
    fn default() -> Self {
        Self {
            left: LinearBound {
                x: 100.0,
                y: 700.0,
                slope: 500.0 / 300.0,
            },
            right: LinearBound {
                x: 1000.0,
                y: 450.0,
                slope: 280.0 / 35.0,
            },
        }
    }
}

impl PerspectiveBounds {
    pub fn min_left_x(&self, y1: f32) -> f32 {
        self.left.x + (self.left.y - y1) * self.left.slope
    }

    pub fn max_right_x(&self, y2: f32) -> f32 {
        self.right.x + (y2 - self.right.y) * self.right.slope
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoFilterConfig {
    /// `None` accepts every raw detection.
    pub perspective: Option<PerspectiveBounds>,
    pub min_region_width: i32,
    pub min_region_height: i32,
}

impl Default for GeoFilterConfig {
    fn default() -> Self {
        Self {
            perspective: Some(PerspectiveBounds::default()),
            min_region_width: 16,
            min_region_height: 16,
        }
    }
}

/// Geometric false-positive suppression for raw boxes and final regions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoFilter {
    config: GeoFilterConfig,
}

impl GeoFilter {
    pub fn new(config: GeoFilterConfig) -> Self {
        Self { config }
    }

    /// Accept everything that reaches it; regions still need the minimum size.
    pub fn permissive() -> Self {
        Self::new(GeoFilterConfig {
            perspective: None,
            ..Default::default()
        })
    }

    /// Perspective test for a raw scanner detection.
    pub fn accepts(&self, b: &BoundingBox) -> bool {
        match &self.config.perspective {
            Some(bounds) => {
                b.x1 as f32 >= bounds.min_left_x(b.y1 as f32)
                    && b.x2 as f32 <= bounds.max_right_x(b.y2 as f32)
            }
            None => true,
        }
    }

    /// Minimum-size test for a consolidated region: both sides strictly
    /// larger than the configured minimum.
    pub fn accepts_region(&self, b: &BoundingBox) -> bool {
        b.width() > self.config.min_region_width && b.height() > self.config.min_region_height
    }
}
