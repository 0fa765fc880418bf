use ndarray::{s, Array2};

use super::types::{BoundingBox, Heatmap};

/// Fresh zeroed heatmap with one vote per covering box.
///
/// `shape` is `(height, width)`. Each box adds 1 to the half-open range
/// `[y1, y2) × [x1, x2)`, clipped to the map. Votes are not clamped.
pub fn accumulate(boxes: &[BoundingBox], shape: (usize, usize)) -> Heatmap {
    let mut heat = Array2::<u32>::zeros(shape);
    add_heat(&mut heat, boxes);
    heat
}

/// Add votes for `boxes` into an existing map.
pub fn add_heat(heat: &mut Heatmap, boxes: &[BoundingBox]) {
    let (h, w) = heat.dim();
    for b in boxes {
        let b = b.normalized();
        let x1 = clamp_index(b.x1, w);
        let x2 = clamp_index(b.x2, w);
        let y1 = clamp_index(b.y1, h);
        let y2 = clamp_index(b.y2, h);
        if x1 >= x2 || y1 >= y2 {
            continue;
        }
        heat.slice_mut(s![y1..y2, x1..x2]).mapv_inplace(|v| v + 1);
    }
}

fn clamp_index(v: i32, len: usize) -> usize {
    (v.max(0) as usize).min(len)
}

/// Zero every cell with a value `<= threshold`.
pub fn apply_threshold(heat: &mut Heatmap, threshold: u32) {
    heat.mapv_inplace(|v| if v <= threshold { 0 } else { v });
}

/// Copy of `heat` clipped to `[0, max]` for display.
pub fn clip(heat: &Heatmap, max: u32) -> Heatmap {
    heat.mapv(|v| v.min(max))
}
