use thiserror::Error;

use crate::detection::domain::detection::DetectionBatch;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectorError {
    /// Model or label resources are missing or malformed. Fatal to
    /// detection capability; the pipeline reports it once and stops.
    #[error("detector initialization failed: {0}")]
    Initialization(String),
    /// `detect` was called before `setup` completed (or after `clear`).
    #[error("detector not ready: setup() has not completed")]
    NotReady,
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Domain interface for bus detection.
///
/// Lifecycle: `setup` must complete before the first `detect`; `clear`
/// releases model resources and is idempotent. Implementations may be
/// stateful, hence `&mut self`. The pipeline guarantees one call at a
/// time from a single worker thread, and that no detection is in flight
/// when `clear` runs.
pub trait BusDetector: Send {
    /// Loads model and label resources.
    fn setup(&mut self) -> Result<(), DetectorError>;

    /// Runs detection on one frame. Calling this before `setup` has
    /// completed is a precondition violation and returns
    /// [`DetectorError::NotReady`].
    fn detect(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectorError>;

    /// Releases underlying model resources. Idempotent.
    fn clear(&mut self);
}
