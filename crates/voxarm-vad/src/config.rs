use serde::{Deserialize, Serialize};

use super::constants::{FRAME_SIZE_SAMPLES, SAMPLE_RATE_HZ};

/// WebRTC-style aggressiveness: 0 is the least aggressive (fewest false
/// positives on ambiguous frames), 3 the most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Aggressiveness {
    Quality,
    LowBitrate,
    Aggressive,
    VeryAggressive,
}

impl Default for Aggressiveness {
    fn default() -> Self {
        // Mode 0 proved the best balance for command capture on the arm's mic
        Self::Quality
    }
}

impl TryFrom<u8> for Aggressiveness {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Quality),
            1 => Ok(Self::LowBitrate),
            2 => Ok(Self::Aggressive),
            3 => Ok(Self::VeryAggressive),
            other => Err(format!("VAD aggressiveness must be 0-3, got {}", other)),
        }
    }
}

impl From<Aggressiveness> for u8 {
    fn from(a: Aggressiveness) -> u8 {
        match a {
            Aggressiveness::Quality => 0,
            Aggressiveness::LowBitrate => 1,
            Aggressiveness::Aggressive => 2,
            Aggressiveness::VeryAggressive => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    pub aggressiveness: Aggressiveness,
    pub frame_size_samples: usize,
    pub sample_rate_hz: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            aggressiveness: Aggressiveness::default(),
            frame_size_samples: FRAME_SIZE_SAMPLES,
            sample_rate_hz: SAMPLE_RATE_HZ,
        }
    }
}

impl VadConfig {
    pub fn frame_duration_ms(&self) -> f32 {
        (self.frame_size_samples as f32 * 1000.0) / self.sample_rate_hz as f32
    }
}
