use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::announce::domain::announcement_policy::AnnouncementPolicy;
use crate::announce::domain::speech_synthesizer::SpeechSynthesizer;
use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::bus_detector::BusDetector;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::present::domain::presentation_sink::PresentationSink;

/// Configuration for a pipeline session.
pub struct PipelineConfig {
    /// Pace the feeder to the source fps, emulating a live camera.
    /// Sources without a rate (image directories) are never paced.
    pub realtime: bool,
    /// Stop after this many frames have been fed.
    pub max_frames: Option<usize>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            realtime: false,
            max_frames: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Abstracts how the feed → detect → announce → present session is
/// executed.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations (e.g. threaded). The sink and synthesizer
/// are invoked on the calling thread only: implementations must marshal
/// worker results there before presenting.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        detector: Box<dyn BusDetector>,
        policy: AnnouncementPolicy,
        sink: &mut dyn PresentationSink,
        synthesizer: &mut dyn SpeechSynthesizer,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
