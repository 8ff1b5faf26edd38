pub mod espeak_synthesizer;
