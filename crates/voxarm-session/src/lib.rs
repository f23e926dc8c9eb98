//! The VoxArm core: speech segmentation on the audio-callback path, the
//! session controller on the control thread, and the command matcher between
//! transcription and actuation.

pub mod collaborators;
pub mod command;
pub mod config;
pub mod controller;
pub mod mode;
pub mod segmenter;

pub use collaborators::{
    CommandDispatcher, DispatchError, DispatchOutcome, PromptCue, PromptError, PromptPlayer,
    UtteranceSink,
};
pub use command::{CommandVocabulary, VocabularyError};
pub use config::{ControllerConfig, SessionConfig};
pub use controller::SessionController;
pub use mode::{Mode, ModeFlag};
pub use segmenter::{FinalizeReason, FinalizedUtterance, SegmenterOutcome, SpeechSegmenter};
