use std::io::Write;

use crate::announce::domain::announcement_policy::Announcement;
use crate::detection::domain::detection::DetectionBatch;
use crate::present::domain::presentation_sink::{render_batch, PresentationSink};

/// Writes each batch summary to stdout, one block per processed frame.
pub struct TerminalSink<W: Write = std::io::Stdout> {
    out: W,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn present(&mut self, batch: &DetectionBatch, announcements: &[Announcement]) {
        let text = render_batch(batch);
        if writeln!(self.out, "[frame {}]\n{text}", batch.frame_index).is_err() {
            log::warn!("failed to write presentation output");
        }
        for a in announcements {
            log::debug!("announcing {}: {}", a.class_name, a.phrase);
        }
    }
}
