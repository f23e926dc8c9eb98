//! Audio constants shared by every stage of the pipeline.

/// Standard sample rate for VAD and transcription (Hz)
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Frame duration in milliseconds (WebRTC-style VADs support 10, 20 or 30 ms)
pub const FRAME_DURATION_MS: u32 = 30;

/// Samples per frame at the standard rate.
/// At 16kHz, 30ms = 480 samples.
pub const FRAME_SIZE_SAMPLES: usize =
    (SAMPLE_RATE_HZ as usize * FRAME_DURATION_MS as usize) / 1000;

/// Mono audio everywhere downstream of capture
pub const CHANNELS_MONO: u16 = 1;
