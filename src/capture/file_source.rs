use super::{Frame, ImageSource};
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::PathBuf;

use crate::detection::NormalizedImage;

/// Reads images from a fixed list of files, in order.
pub struct FileSource {
    paths: VecDeque<PathBuf>,
}

impl FileSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: VecDeque<PathBuf> = paths.into_iter().map(Into::into).collect();
        tracing::info!("Image source with {} file(s)", paths.len());
        Self { paths }
    }
}

impl ImageSource for FileSource {
    fn next_image(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };

        let decoded = image::open(&path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        let image = NormalizedImage::from_dynamic(&decoded)
            .with_context(|| format!("Unusable image {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        tracing::debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());

        Ok(Some(Frame { name, image }))
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, RgbaImage};

    #[test]
    fn reads_files_in_order_then_stops() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbImage::from_pixel(8, 4, Rgb([255, 0, 0])).save(&a).unwrap();
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])).save(&b).unwrap();

        let mut source = FileSource::new([a, b]);
        assert_eq!(source.remaining(), Some(2));
        let first = source.next_image().unwrap().unwrap();
        assert_eq!(first.name, "a");
        assert_eq!(first.image.as_rgb().get_pixel(0, 0).0, [1.0, 0.0, 0.0]);
        assert_eq!(source.next_image().unwrap().unwrap().name, "b");
        assert!(source.next_image().unwrap().is_none());
    }

    #[test]
    fn four_channel_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::new(4, 4).save(&path).unwrap();

        let mut source = FileSource::new([path]);
        assert!(source.next_image().is_err());
    }
}
