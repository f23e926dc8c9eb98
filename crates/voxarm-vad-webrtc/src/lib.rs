//! WebRTC-style VAD engine backed by the pure-Rust `earshot` port.

mod engine;

pub use engine::WebRtcVadEngine;
