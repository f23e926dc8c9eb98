use std::time::Duration;

use serde::{Deserialize, Serialize};

use voxarm_vad::constants::{FRAME_DURATION_MS, SAMPLE_RATE_HZ};

/// Timing thresholds for a listening session. Set once at startup, never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub sample_rate_hz: u32,
    pub frame_duration_ms: u32,
    /// Consecutive speech frames required to confirm the start of a command.
    pub speech_confirm_frames: u32,
    /// Silence after confirmed speech that ends the command, in milliseconds.
    pub silence_confirm_ms: u32,
    /// Hard cap on a listening session, speech or no speech.
    pub max_command_duration_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: SAMPLE_RATE_HZ,
            frame_duration_ms: FRAME_DURATION_MS,
            // 3 * 30ms = 90ms of confirmed speech filters out brief noises
            speech_confirm_frames: 3,
            silence_confirm_ms: 500,
            max_command_duration_ms: 5_000,
        }
    }
}

impl SessionConfig {
    pub fn frame_size_samples(&self) -> usize {
        (self.sample_rate_hz as usize * self.frame_duration_ms as usize) / 1000
    }

    /// Silence threshold in frames, rounded up so the covered span is never
    /// shorter than `silence_confirm_ms` (500ms / 30ms -> 17 frames).
    pub fn silence_confirm_frames(&self) -> u32 {
        self.silence_confirm_ms.div_ceil(self.frame_duration_ms)
    }

    pub fn max_command_duration(&self) -> Duration {
        Duration::from_millis(self.max_command_duration_ms)
    }
}

/// Pacing of the controller's prompt/listen cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Pause between returning to idle and playing the next command cue.
    pub inter_prompt_delay_ms: u64,
    /// Extra slack past the max session duration when waiting for the
    /// finalize handoff; a miss means the audio stream died.
    pub finalize_wait_slack_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            inter_prompt_delay_ms: 3_000,
            finalize_wait_slack_ms: 2_000,
        }
    }
}

impl ControllerConfig {
    pub fn inter_prompt_delay(&self) -> Duration {
        Duration::from_millis(self.inter_prompt_delay_ms)
    }

    pub fn finalize_wait_slack(&self) -> Duration {
        Duration::from_millis(self.finalize_wait_slack_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_command_loop() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.frame_size_samples(), 480);
        assert_eq!(cfg.speech_confirm_frames, 3);
        // 500ms at 30ms frames rounds up to 17 frames (~510ms)
        assert_eq!(cfg.silence_confirm_frames(), 17);
        assert_eq!(cfg.max_command_duration(), Duration::from_secs(5));
    }
}
