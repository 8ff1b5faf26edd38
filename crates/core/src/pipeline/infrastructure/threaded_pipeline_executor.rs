use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::announce::domain::announcement_policy::{Announcement, AnnouncementPolicy};
use crate::announce::domain::speech_synthesizer::SpeechSynthesizer;
use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::bus_detector::BusDetector;
use crate::detection::domain::detection::DetectionBatch;
use crate::pipeline::frame_slot::{frame_slot, SlotReceiver, SlotSender};
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::present::domain::presentation_sink::PresentationSink;

/// Messages marshaled from the worker threads to the calling thread.
enum WorkerMessage {
    /// Detector setup completed; detection is enabled from here on.
    Ready,
    Update {
        batch: DetectionBatch,
        announcements: Vec<Announcement>,
    },
    /// One-shot failure report; the affected run stops.
    Fatal(String),
}

/// Executes the session with dedicated feeder and detection threads.
///
/// Layout: `feeder → [keep-latest slot] → detect worker → main`
///
/// The feeder publishes frames into a single keep-latest slot, so a slow
/// detector only ever delays the newest frame instead of building a
/// queue. The worker owns the detector for its whole lifetime: setup
/// before the first frame, `clear` after the last, never with a
/// detection in flight. Presentation and speech happen on the calling
/// thread.
pub struct ThreadedPipelineExecutor;

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        mut source: Box<dyn FrameSource>,
        detector: Box<dyn BusDetector>,
        policy: AnnouncementPolicy,
        sink: &mut dyn PresentationSink,
        synthesizer: &mut dyn SpeechSynthesizer,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let info = source.open()?;

        let total = match config.max_frames {
            Some(m) if info.total_frames > 0 => m.min(info.total_frames),
            Some(m) => m,
            None => info.total_frames,
        };
        let pace = (config.realtime && info.fps > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / info.fps));

        let (slot_tx, slot_rx) = frame_slot();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerMessage>();

        let feeder_handle = spawn_feeder(
            source,
            slot_tx,
            event_tx.clone(),
            config.cancelled.clone(),
            config.max_frames,
            pace,
        );
        let worker_handle = spawn_worker(
            detector,
            policy,
            slot_rx,
            event_tx,
            config.cancelled.clone(),
        );

        let mut first_error: Option<Box<dyn std::error::Error>> = None;
        let mut frames_presented = 0usize;
        let mut speech_enabled = true;

        for message in event_rx.iter() {
            match message {
                WorkerMessage::Ready => logger.info("detector ready"),
                WorkerMessage::Update {
                    batch,
                    announcements,
                } => {
                    frames_presented += 1;
                    logger.timing("detect", batch.inference_time.as_secs_f64() * 1000.0);
                    logger.progress(frames_presented, total);

                    sink.present(&batch, &announcements);

                    if speech_enabled {
                        for announcement in &announcements {
                            if let Err(e) = synthesizer.speak(&announcement.phrase) {
                                log::warn!("speech disabled for this session: {e}");
                                speech_enabled = false;
                                break;
                            }
                        }
                    }
                }
                WorkerMessage::Fatal(message) => {
                    config.cancelled.store(true, Ordering::Relaxed);
                    if first_error.is_none() {
                        first_error = Some(message.into());
                    }
                    break;
                }
            }
        }

        join_threads(feeder_handle, worker_handle, logger, &mut first_error);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn spawn_feeder(
    mut source: Box<dyn FrameSource>,
    slot_tx: SlotSender,
    event_tx: crossbeam_channel::Sender<WorkerMessage>,
    cancelled: Arc<AtomicBool>,
    max_frames: Option<usize>,
    pace: Option<Duration>,
) -> std::thread::JoinHandle<u64> {
    std::thread::spawn(move || {
        let mut fed = 0usize;
        for frame_result in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            match frame_result {
                Ok(frame) => {
                    if !slot_tx.publish(frame) {
                        break;
                    }
                    fed += 1;
                    if max_frames.is_some_and(|m| fed >= m) {
                        break;
                    }
                    if let Some(delay) = pace {
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => {
                    let _ = event_tx.send(WorkerMessage::Fatal(format!(
                        "frame source failed: {e}"
                    )));
                    break;
                }
            }
        }
        source.close();
        slot_tx.dropped()
    })
}

fn spawn_worker(
    mut detector: Box<dyn BusDetector>,
    policy: AnnouncementPolicy,
    slot_rx: SlotReceiver,
    event_tx: crossbeam_channel::Sender<WorkerMessage>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        // Setup gates detection: nothing is detected until it completes,
        // and a failed setup disables detection for the whole session.
        if let Err(e) = detector.setup() {
            let _ = event_tx.send(WorkerMessage::Fatal(e.to_string()));
            detector.clear();
            return;
        }
        let _ = event_tx.send(WorkerMessage::Ready);

        while let Some(frame) = slot_rx.take() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            match detector.detect(&frame) {
                Ok(batch) => {
                    let announcements = policy.announcements(&batch);
                    if event_tx
                        .send(WorkerMessage::Update {
                            batch,
                            announcements,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    let _ = event_tx.send(WorkerMessage::Fatal(e.to_string()));
                    break;
                }
            }
        }

        // The loop is over, so no detection is in flight.
        detector.clear();
    })
}

/// Joins both threads, coalescing the first error encountered, and
/// records the final dropped-frame count.
fn join_threads(
    feeder_handle: std::thread::JoinHandle<u64>,
    worker_handle: std::thread::JoinHandle<()>,
    logger: &mut dyn PipelineLogger,
    first_error: &mut Option<Box<dyn std::error::Error>>,
) {
    fn set_if_none(slot: &mut Option<Box<dyn std::error::Error>>, err: Box<dyn std::error::Error>) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    match feeder_handle.join() {
        Ok(dropped) => logger.metric("frames_dropped", dropped as f64),
        Err(_) => set_if_none(first_error, "Feeder thread panicked".into()),
    }

    if worker_handle.join().is_err() {
        set_if_none(first_error, "Detect thread panicked".into());
    }
}
