use crate::announce::domain::announcement_policy::Announcement;
use crate::detection::domain::detection::DetectionBatch;

/// Shown whenever a frame produced no detections.
pub const NO_DETECTION_TEXT: &str = "No bus detected";

/// Renders one detection batch as display text.
///
/// Non-empty batches produce a latency header plus one
/// `{class}: {confidence}%` line per detection, in batch order; empty
/// batches produce the fixed no-detection message.
pub fn render_batch(batch: &DetectionBatch) -> String {
    if batch.is_empty() {
        return NO_DETECTION_TEXT.to_string();
    }

    let mut text = format!("Inference time: {}ms", batch.inference_time.as_millis());
    for det in &batch.detections {
        text.push('\n');
        text.push_str(&format!(
            "{}: {:.1}%",
            det.class_name,
            det.confidence * 100.0
        ));
    }
    text
}

/// Consumes rendered results on the foreground thread.
///
/// The pipeline marshals worker output to the calling thread before
/// invoking this, one update per processed frame.
pub trait PresentationSink {
    fn present(&mut self, batch: &DetectionBatch, announcements: &[Announcement]);
}
