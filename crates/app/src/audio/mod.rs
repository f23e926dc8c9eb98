pub mod capture;
pub mod chunker;
pub mod pipeline;

pub use capture::AudioCaptureThread;
pub use chunker::FrameChunker;
pub use pipeline::CallbackPipeline;
