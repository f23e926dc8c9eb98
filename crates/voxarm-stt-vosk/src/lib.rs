//! Vosk backend for VoxArm speech-to-text.
//!
//! Gated behind the `vosk` cargo feature because it links against the system
//! libvosk; builds without it fall back to `voxarm_stt::NoopTranscriber`.

#[cfg(feature = "vosk")]
mod vosk_transcriber;

#[cfg(feature = "vosk")]
pub use vosk_transcriber::VoskTranscriber;
