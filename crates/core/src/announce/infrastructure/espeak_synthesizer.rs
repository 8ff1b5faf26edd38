use std::process::{Child, Command, Stdio};

use crate::announce::domain::speech_synthesizer::{SpeechError, SpeechSynthesizer};

pub const DEFAULT_VOICE: &str = "en";

/// Speech via the `espeak-ng` command-line engine.
///
/// Each `speak` call kills any still-running utterance first, matching
/// the announcement policy's flush-queue semantics. Availability is
/// probed once at construction so a missing engine surfaces as a single
/// initialization error instead of a failure per phrase.
pub struct EspeakSynthesizer {
    voice: String,
    current: Option<Child>,
}

impl EspeakSynthesizer {
    pub fn new(voice: &str) -> Result<Self, SpeechError> {
        let probe = Command::new("espeak-ng")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if probe.is_err() {
            return Err(SpeechError::EngineUnavailable(
                "espeak-ng not found on PATH".to_string(),
            ));
        }

        Ok(Self {
            voice: voice.to_string(),
            current: None,
        })
    }

    fn reap_current(&mut self) {
        if let Some(mut child) = self.current.take() {
            // Already-exited children return Ok from kill on some
            // platforms and InvalidInput on others; either way the
            // utterance is over.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl SpeechSynthesizer for EspeakSynthesizer {
    fn speak(&mut self, phrase: &str) -> Result<(), SpeechError> {
        self.reap_current();

        let child = Command::new("espeak-ng")
            .arg("-v")
            .arg(&self.voice)
            .arg("--")
            .arg(phrase)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(SpeechError::Spawn)?;

        self.current = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        self.reap_current();
    }
}

impl Drop for EspeakSynthesizer {
    fn drop(&mut self) {
        self.reap_current();
    }
}
