use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;

/// Supplies frames to the detection pipeline.
///
/// Implementations handle I/O details (codec, container, directory
/// sweep) while the pipeline works with the abstract `Frame` and
/// `SourceInfo` types. The live camera of the original system is an
/// instance of this seam; files and image directories stand in for it
/// here.
pub trait FrameSource: Send {
    /// Opens the source and returns its description.
    fn open(&mut self) -> Result<SourceInfo, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
