//! Speech-to-text abstraction for VoxArm.
//!
//! The pipeline hands a whole finalized utterance to the transcriber at once;
//! there is no streaming/partial-result path because command capture always
//! finishes before transcription starts.

pub mod types;

pub use types::{SttError, TranscriptionConfig};

/// Batch transcriber: raw PCM16 in, text out.
///
/// `Ok(None)` means the engine produced no text (silence, noise); that is not
/// an error and maps to "no command recognized" upstream.
pub trait Transcriber: Send {
    fn transcribe(&mut self, pcm: &[i16]) -> Result<Option<String>, SttError>;
}

/// Transcriber that recognizes nothing. Used in tests and in builds without a
/// speech model.
#[derive(Debug, Default)]
pub struct NoopTranscriber;

impl Transcriber for NoopTranscriber {
    fn transcribe(&mut self, pcm: &[i16]) -> Result<Option<String>, SttError> {
        tracing::debug!(samples = pcm.len(), "NoopTranscriber discarding utterance");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_recognizes_nothing() {
        let mut t = NoopTranscriber;
        assert_eq!(t.transcribe(&[0i16; 480]).unwrap(), None);
    }
}
