use std::sync::atomic::{AtomicU8, Ordering};

/// Top-level mode of the command loop.
///
/// Owned by the session controller; the audio thread only ever reads
/// snapshots through [`ModeFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Idle = 0,
    PlayingPrompt = 1,
    ListeningForCommand = 2,
}

impl Mode {
    fn from_u8(v: u8) -> Mode {
        match v {
            1 => Mode::PlayingPrompt,
            2 => Mode::ListeningForCommand,
            _ => Mode::Idle,
        }
    }
}

/// Race-free mode cell shared between the control thread (sole writer) and
/// the audio-callback thread (reader).
pub struct ModeFlag(AtomicU8);

impl Default for ModeFlag {
    fn default() -> Self {
        Self::new(Mode::Idle)
    }
}

impl ModeFlag {
    pub fn new(mode: Mode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    pub fn set(&self, mode: Mode) {
        let prev = Mode::from_u8(self.0.swap(mode as u8, Ordering::Release));
        if prev != mode {
            tracing::debug!(?prev, next = ?mode, "Mode transition");
        }
    }

    pub fn get(&self) -> Mode {
        Mode::from_u8(self.0.load(Ordering::Acquire))
    }
}
