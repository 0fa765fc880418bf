mod directory;

pub use directory::DirectoryOutput;

use anyhow::Result;

use crate::capture::Frame;
use crate::detection::DetectionResult;

/// Trait for detection result destinations
pub trait OutputSink {
    /// Persist the result for one input frame
    fn write_result(&mut self, frame: &Frame, result: &DetectionResult) -> Result<()>;
}
