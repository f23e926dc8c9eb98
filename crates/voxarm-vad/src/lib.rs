pub mod config;
pub mod constants;
pub mod engine;

pub use config::{Aggressiveness, VadConfig};
pub use constants::{CHANNELS_MONO, FRAME_DURATION_MS, FRAME_SIZE_SAMPLES, SAMPLE_RATE_HZ};
pub use engine::{VadEngine, VadError};
