use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::announce::domain::announcement_policy::AnnouncementPolicy;
use crate::announce::domain::speech_synthesizer::SpeechSynthesizer;
use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::bus_detector::BusDetector;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::present::domain::presentation_sink::PresentationSink;

/// Orchestrates a full watch session.
///
/// Wires domain components together and delegates execution to a
/// `PipelineExecutor`. This is a single-use struct: `execute` consumes
/// the owned components, so calling it twice will fail.
pub struct WatchUseCase {
    source: Option<Box<dyn FrameSource>>,
    detector: Option<Box<dyn BusDetector>>,
    policy: AnnouncementPolicy,
    executor: Box<dyn PipelineExecutor>,
    realtime: bool,
    max_frames: Option<usize>,
    cancelled: Arc<AtomicBool>,
}

impl WatchUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn BusDetector>,
        policy: AnnouncementPolicy,
        executor: Box<dyn PipelineExecutor>,
        realtime: bool,
        max_frames: Option<usize>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            detector: Some(detector),
            policy,
            executor,
            realtime,
            max_frames,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        sink: &mut dyn PresentationSink,
        synthesizer: &mut dyn SpeechSynthesizer,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let config = PipelineConfig {
            realtime: self.realtime,
            max_frames: self.max_frames,
            cancelled: self.cancelled.clone(),
        };

        self.executor.execute(
            self.source.take().ok_or("Session already executed")?,
            self.detector.take().ok_or("Session already executed")?,
            self.policy,
            sink,
            synthesizer,
            logger,
            config,
        )
    }
}
