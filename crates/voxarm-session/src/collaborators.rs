//! Trait seams between the session controller and the outside world:
//! prompt playback, command actuation, and the utterance archive. The
//! controller holds these as boxed trait objects so tests can substitute
//! scripted fakes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Pre-recorded cues played over the speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptCue {
    /// Greeting played once at startup.
    Welcome,
    /// Announces the calibration stretch at startup.
    Stretch,
    /// One-time usage explanation after calibration.
    Instructions,
    /// Played before every listening window.
    CommandCue,
}

impl PromptCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptCue::Welcome => "welcome",
            PromptCue::Stretch => "stretch",
            PromptCue::Instructions => "instructions",
            PromptCue::CommandCue => "command_cue",
        }
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),
    #[error("playback of '{cue}' failed: {detail}")]
    Playback { cue: &'static str, detail: String },
}

/// Blocking playback of a cue. Returns once the cue has finished so the
/// listening window never overlaps the speaker output.
pub trait PromptPlayer: Send {
    fn play(&mut self, cue: PromptCue) -> Result<(), PromptError>;
}

/// Result of handing a recognized command to the actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command was applied.
    Executed,
    /// The command was understood but refused, e.g. a move past an axis
    /// limit. The arm state is unchanged.
    Rejected { reason: String },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command token '{0}'")]
    UnknownCommand(String),
    #[error("actuator failure: {0}")]
    Actuator(String),
}

/// Executes recognized command tokens against the arm.
pub trait CommandDispatcher: Send {
    fn dispatch(&mut self, command: &str) -> Result<DispatchOutcome, DispatchError>;

    /// Drive the arm through its reference motion and return it home.
    fn calibrate(&mut self) -> Result<(), DispatchError>;
}

/// Persists finalized utterances for offline inspection.
pub trait UtteranceSink: Send {
    fn persist(&mut self, samples: &[i16]) -> io::Result<PathBuf>;
}
