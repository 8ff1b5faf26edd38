use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("failed to start utterance: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Domain interface for speech output.
///
/// Flush-queue semantics: `speak` cancels any in-progress utterance
/// before starting the new one, so the most recent announcement always
/// wins.
pub trait SpeechSynthesizer: Send {
    fn speak(&mut self, phrase: &str) -> Result<(), SpeechError>;

    /// Stops any in-progress utterance. Idempotent.
    fn stop(&mut self);
}

/// Silent synthesizer for tests and `--quiet` runs.
#[derive(Default)]
pub struct NullSynthesizer {
    pub spoken: Vec<String>,
}

impl NullSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpeechSynthesizer for NullSynthesizer {
    fn speak(&mut self, phrase: &str) -> Result<(), SpeechError> {
        self.spoken.push(phrase.to_string());
        Ok(())
    }

    fn stop(&mut self) {}
}
