mod file_source;

pub use file_source::FileSource;

use anyhow::Result;

use crate::detection::NormalizedImage;

/// One decoded, normalized input image.
pub struct Frame {
    /// Short name used for output files (usually the file stem).
    pub name: String,
    pub image: NormalizedImage,
}

/// Trait for image sources
pub trait ImageSource {
    /// Next image, or `None` when the source is exhausted
    fn next_image(&mut self) -> Result<Option<Frame>>;

    /// Number of images left, if known
    fn remaining(&self) -> Option<usize> {
        None
    }
}
