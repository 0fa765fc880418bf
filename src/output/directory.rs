use super::OutputSink;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::Frame;
use crate::detection::annotate::{draw_boxes, heatmap_to_gray, to_rgb8, BOX_COLOR};
use crate::detection::{BoundingBox, DetectionResult};

/// JSON summary written next to the rendered images.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    name: &'a str,
    width: usize,
    height: usize,
    boxes: &'a [BoundingBox],
    raw_boxes: &'a [BoundingBox],
    max_heat: u32,
}

/// Writes per-image diagnostics into a directory:
/// `<name>_raw.png`, `<name>_boxes.png`, `<name>_heat.png` and `<name>.json`.
pub struct DirectoryOutput {
    dir: PathBuf,
}

impl DirectoryOutput {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        tracing::info!("Writing results to {}", dir.display());
        Ok(Self { dir })
    }

    fn path(&self, name: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{name}{suffix}"))
    }
}

impl OutputSink for DirectoryOutput {
    fn write_result(&mut self, frame: &Frame, result: &DetectionResult) -> Result<()> {
        let name = frame.name.as_str();
        let raw_path = self.path(name, "_raw.png");
        result
            .annotated
            .save(&raw_path)
            .with_context(|| format!("Failed to save {}", raw_path.display()))?;

        let mut final_img = to_rgb8(frame.image.as_rgb());
        draw_boxes(&mut final_img, &result.boxes, BOX_COLOR);
        let boxes_path = self.path(name, "_boxes.png");
        final_img
            .save(&boxes_path)
            .with_context(|| format!("Failed to save {}", boxes_path.display()))?;

        let heat_path = self.path(name, "_heat.png");
        heatmap_to_gray(&result.heatmap)
            .save(&heat_path)
            .with_context(|| format!("Failed to save {}", heat_path.display()))?;

        let (height, width) = result.heatmap.dim();
        let summary = Summary {
            name,
            width,
            height,
            boxes: &result.boxes,
            raw_boxes: &result.raw_boxes,
            max_heat: result.heatmap.iter().copied().max().unwrap_or(0),
        };
        let json_path = self.path(name, ".json");
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;

        tracing::debug!("Wrote results for {}", name);
        Ok(())
    }
}
