//! Connected-component extraction over a thresholded heatmap.
//!
//! Labeling is two-pass union-find with 8-connectivity (orthogonal and
//! diagonal neighbors). Final labels are assigned in raster order of each
//! region's first pixel, so label 1 is the region touched first when scanning
//! rows top to bottom.
use ndarray::Array2;

use super::geo::GeoFilter;
use super::heat::{apply_threshold, clip};
use super::types::{BoundingBox, Heatmap, LabelMap};

/// Threshold `heatmap`, label its surviving cells and keep the regions that
/// pass the minimum-size rule.
///
/// Returns the boxes in label order together with the thresholded heatmap
/// clipped to `[0, clip_max]`. Labeling runs on the unclipped votes.
pub fn extract(
    mut heatmap: Heatmap,
    threshold: u32,
    clip_max: u32,
    geo: &GeoFilter,
) -> (Vec<BoundingBox>, Heatmap) {
    let _span = tracing::debug_span!("extract_regions").entered();

    apply_threshold(&mut heatmap, threshold);
    let (labels, count) = label(&heatmap);
    let boxes: Vec<BoundingBox> = region_boxes(&labels, count)
        .into_iter()
        .filter(|b| {
            let keep = geo.accepts_region(b);
            if !keep {
                tracing::debug!(?b, "region below minimum size");
            }
            keep
        })
        .collect();

    tracing::debug!(regions = count, kept = boxes.len(), "regions extracted");
    (boxes, clip(&heatmap, clip_max))
}

/// Label the non-zero cells of `grid`. Returns the label map and the number
/// of regions.
pub fn label(grid: &Array2<u32>) -> (LabelMap, u32) {
    let (h, w) = grid.dim();
    let mut labels = LabelMap::zeros((h, w));
    let mut forest = DisjointSet::new();

    for y in 0..h {
        for x in 0..w {
            if grid[[y, x]] == 0 {
                continue;
            }
            let mut current = 0u32;
            for (ny, nx) in previous_neighbors(y, x, w) {
                let n = labels[[ny, nx]];
                if n == 0 {
                    continue;
                }
                if current == 0 {
                    current = n;
                } else {
                    forest.union(current, n);
                }
            }
            if current == 0 {
                current = forest.make_set();
            }
            labels[[y, x]] = current;
        }
    }

    // Second pass: collapse to roots and renumber in raster order.
    let mut remap = vec![0u32; forest.len() + 1];
    let mut count = 0u32;
    for cell in labels.iter_mut() {
        if *cell == 0 {
            continue;
        }
        let root = forest.find(*cell) as usize;
        if remap[root] == 0 {
            count += 1;
            remap[root] = count;
        }
        *cell = remap[root];
    }
    (labels, count)
}

/// Already-visited 8-neighbors of `(y, x)` in raster order.
fn previous_neighbors(y: usize, x: usize, w: usize) -> impl Iterator<Item = (usize, usize)> {
    let mut out = [(0usize, 0usize); 4];
    let mut n = 0;
    if x > 0 {
        out[n] = (y, x - 1);
        n += 1;
    }
    if y > 0 {
        if x > 0 {
            out[n] = (y - 1, x - 1);
            n += 1;
        }
        out[n] = (y - 1, x);
        n += 1;
        if x + 1 < w {
            out[n] = (y - 1, x + 1);
            n += 1;
        }
    }
    out.into_iter().take(n)
}

/// Half-open bounding box of each label `1..=count`, in label order.
pub fn region_boxes(labels: &LabelMap, count: u32) -> Vec<BoundingBox> {
    let mut bounds = vec![(i32::MAX, i32::MAX, i32::MIN, i32::MIN); count as usize];
    for ((y, x), &l) in labels.indexed_iter() {
        if l == 0 {
            continue;
        }
        let (x, y) = (x as i32, y as i32);
        let b = &mut bounds[(l - 1) as usize];
        b.0 = b.0.min(x);
        b.1 = b.1.min(y);
        b.2 = b.2.max(x);
        b.3 = b.3.max(y);
    }
    bounds
        .into_iter()
        .map(|(x1, y1, x2, y2)| BoundingBox::new(x1, y1, x2 + 1, y2 + 1))
        .collect()
}

struct DisjointSet {
    // Index 0 is unused so that labels can index directly.
    parent: Vec<u32>,
}

impl DisjointSet {
    fn new() -> Self {
        Self { parent: vec![0] }
    }

    fn len(&self) -> usize {
        self.parent.len() - 1
    }

    fn make_set(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi as usize] = lo;
        }
    }
}
