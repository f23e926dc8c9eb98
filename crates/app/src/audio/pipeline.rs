use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};

use voxarm_session::{FinalizedUtterance, ModeFlag, SegmenterOutcome, SpeechSegmenter};
use voxarm_telemetry::PipelineMetrics;

use super::chunker::FrameChunker;

/// Everything that runs inside the device callback: chunking, segmentation,
/// and the non-blocking handoff of finalized utterances to the control
/// thread. Nothing here may block or allocate unboundedly.
pub struct CallbackPipeline {
    chunker: FrameChunker,
    segmenter: SpeechSegmenter,
    mode: Arc<ModeFlag>,
    finalize_tx: Sender<FinalizedUtterance>,
    metrics: Arc<PipelineMetrics>,
}

impl CallbackPipeline {
    pub fn new(
        chunker: FrameChunker,
        segmenter: SpeechSegmenter,
        mode: Arc<ModeFlag>,
        finalize_tx: Sender<FinalizedUtterance>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            chunker,
            segmenter,
            mode,
            finalize_tx,
            metrics,
        }
    }

    /// Feed one device callback's worth of interleaved samples.
    pub fn handle_samples(&mut self, interleaved: &[i16], channels: u16) {
        self.chunker.push(interleaved, channels);
        while let Some(frame) = self.chunker.next_frame() {
            self.metrics.frames_captured.fetch_add(1, Ordering::Relaxed);
            let mode = self.mode.get();
            if let SegmenterOutcome::Finalize(utterance) =
                self.segmenter.process_frame(&frame, mode)
            {
                match self.finalize_tx.try_send(utterance) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("Finalize channel full, dropping utterance");
                        self.metrics
                            .finalize_send_failures
                            .fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        // Controller is gone; the capture thread is about to
                        // be stopped anyway.
                        self.metrics
                            .finalize_send_failures
                            .fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
    }
}
