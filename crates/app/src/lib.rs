//! Application crate: audio I/O, prompt playback, the utterance archive, and
//! the wiring that turns the individual crates into a running arm.

pub mod archive;
pub mod audio;
pub mod config;
pub mod prompt;
pub mod runtime;
