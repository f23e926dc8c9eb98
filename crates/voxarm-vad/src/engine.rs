use thiserror::Error;

#[derive(Error, Debug)]
pub enum VadError {
    #[error("Frame has {got} samples, engine requires {expected}")]
    FrameSize { got: usize, expected: usize },

    #[error("Classifier failed: {0}")]
    Classify(String),
}

/// A trait for per-frame voice-activity classifiers.
///
/// Implementations are driven from the real-time audio callback and must not
/// block or allocate per call.
pub trait VadEngine: Send {
    /// Classify one PCM frame as speech or non-speech.
    fn is_speech(&mut self, frame: &[i16]) -> Result<bool, VadError>;

    /// Drop any accumulated classifier state.
    fn reset(&mut self);

    fn required_sample_rate(&self) -> u32;

    fn required_frame_size_samples(&self) -> usize;
}
