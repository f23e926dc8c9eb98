//! Core types for speech-to-text functionality

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SttError {
    /// Model load / recognizer construction failed. Fatal at startup.
    #[error("Failed to load speech model: {0}")]
    ModelLoad(String),

    /// A single utterance could not be decoded. Recoverable; the session
    /// still resets to idle.
    #[error("Transcription failed: {0}")]
    Decode(String),
}

/// Transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Path to the model directory
    pub model_path: String,
    /// Maximum alternatives requested from the recognizer
    pub max_alternatives: u32,
    /// Include word-level timing in raw results (debug only)
    pub include_words: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model_path: "model".to_string(),
            max_alternatives: 1,
            include_words: false,
        }
    }
}
