use earshot::{VoiceActivityDetector, VoiceActivityProfile};

use voxarm_vad::{Aggressiveness, VadConfig, VadEngine, VadError};

/// Adapts `earshot` to the crate's `VadEngine` trait.
///
/// Frames must be mono i16 at 16 kHz with a 10/20/30 ms duration; the engine
/// enforces the frame size it was configured with.
pub struct WebRtcVadEngine {
    detector: VoiceActivityDetector,
    frame_size_samples: usize,
    sample_rate_hz: u32,
}

fn profile_for(aggressiveness: Aggressiveness) -> VoiceActivityProfile {
    match aggressiveness {
        Aggressiveness::Quality => VoiceActivityProfile::QUALITY,
        Aggressiveness::LowBitrate => VoiceActivityProfile::LBR,
        Aggressiveness::Aggressive => VoiceActivityProfile::AGGRESSIVE,
        Aggressiveness::VeryAggressive => VoiceActivityProfile::VERY_AGGRESSIVE,
    }
}

impl WebRtcVadEngine {
    pub fn new(config: &VadConfig) -> Self {
        let profile = profile_for(config.aggressiveness);
        tracing::debug!(
            aggressiveness = u8::from(config.aggressiveness),
            frame_size = config.frame_size_samples,
            "Creating WebRTC VAD engine"
        );
        Self {
            detector: VoiceActivityDetector::new(profile),
            frame_size_samples: config.frame_size_samples,
            sample_rate_hz: config.sample_rate_hz,
        }
    }
}

impl VadEngine for WebRtcVadEngine {
    fn is_speech(&mut self, frame: &[i16]) -> Result<bool, VadError> {
        if frame.len() != self.frame_size_samples {
            return Err(VadError::FrameSize {
                got: frame.len(),
                expected: self.frame_size_samples,
            });
        }
        self.detector
            .predict_16khz(frame)
            .map_err(|e| VadError::Classify(format!("{:?}", e)))
    }

    fn reset(&mut self) {
        self.detector.reset();
    }

    fn required_sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    fn required_frame_size_samples(&self) -> usize {
        self.frame_size_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxarm_vad::FRAME_SIZE_SAMPLES;

    #[test]
    fn rejects_wrong_frame_size() {
        let mut engine = WebRtcVadEngine::new(&VadConfig::default());
        let short = vec![0i16; 100];
        assert!(matches!(
            engine.is_speech(&short),
            Err(VadError::FrameSize { got: 100, .. })
        ));
    }

    #[test]
    fn classifies_digital_silence_as_non_speech() {
        let mut engine = WebRtcVadEngine::new(&VadConfig::default());
        let silence = vec![0i16; FRAME_SIZE_SAMPLES];
        assert!(!engine.is_speech(&silence).unwrap());
    }

    #[test]
    fn reports_configured_geometry() {
        let engine = WebRtcVadEngine::new(&VadConfig::default());
        assert_eq!(engine.required_sample_rate(), 16_000);
        assert_eq!(engine.required_frame_size_samples(), FRAME_SIZE_SAMPLES);
    }
}
