use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared counters for cross-thread pipeline monitoring.
///
/// Everything the audio callback touches is an atomic; the control thread may
/// take the `last_command_time` lock.
#[derive(Clone)]
pub struct PipelineMetrics {
    // Audio-thread counters
    pub frames_captured: Arc<AtomicU64>,
    pub classifier_errors: Arc<AtomicU64>,
    pub finalize_send_failures: Arc<AtomicU64>,

    // Control-thread counters
    pub sessions_finalized: Arc<AtomicU64>,
    pub sessions_timed_out: Arc<AtomicU64>,
    pub empty_finalizes: Arc<AtomicU64>,
    pub transcription_failures: Arc<AtomicU64>,
    pub commands_recognized: Arc<AtomicU64>,
    /// Transcript produced, but no vocabulary word in it.
    pub commands_unmatched: Arc<AtomicU64>,
    /// Command understood but refused by the actuator (limit violation).
    pub commands_rejected: Arc<AtomicU64>,
    pub archive_failures: Arc<AtomicU64>,

    pub last_command_time: Arc<RwLock<Option<Instant>>>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            frames_captured: Arc::new(AtomicU64::new(0)),
            classifier_errors: Arc::new(AtomicU64::new(0)),
            finalize_send_failures: Arc::new(AtomicU64::new(0)),
            sessions_finalized: Arc::new(AtomicU64::new(0)),
            sessions_timed_out: Arc::new(AtomicU64::new(0)),
            empty_finalizes: Arc::new(AtomicU64::new(0)),
            transcription_failures: Arc::new(AtomicU64::new(0)),
            commands_recognized: Arc::new(AtomicU64::new(0)),
            commands_unmatched: Arc::new(AtomicU64::new(0)),
            commands_rejected: Arc::new(AtomicU64::new(0)),
            archive_failures: Arc::new(AtomicU64::new(0)),
            last_command_time: Arc::new(RwLock::new(None)),
        }
    }
}

/// Point-in-time snapshot for periodic stats logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_captured: u64,
    pub classifier_errors: u64,
    pub finalize_send_failures: u64,
    pub sessions_finalized: u64,
    pub sessions_timed_out: u64,
    pub empty_finalizes: u64,
    pub transcription_failures: u64,
    pub commands_recognized: u64,
    pub commands_unmatched: u64,
    pub commands_rejected: u64,
    pub archive_failures: u64,
}

impl PipelineMetrics {
    pub fn mark_command(&self) {
        self.commands_recognized.fetch_add(1, Ordering::Relaxed);
        *self.last_command_time.write() = Some(Instant::now());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            classifier_errors: self.classifier_errors.load(Ordering::Relaxed),
            finalize_send_failures: self.finalize_send_failures.load(Ordering::Relaxed),
            sessions_finalized: self.sessions_finalized.load(Ordering::Relaxed),
            sessions_timed_out: self.sessions_timed_out.load(Ordering::Relaxed),
            empty_finalizes: self.empty_finalizes.load(Ordering::Relaxed),
            transcription_failures: self.transcription_failures.load(Ordering::Relaxed),
            commands_recognized: self.commands_recognized.load(Ordering::Relaxed),
            commands_unmatched: self.commands_unmatched.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            archive_failures: self.archive_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = PipelineMetrics::default();
        metrics.frames_captured.fetch_add(42, Ordering::Relaxed);
        metrics.mark_command();

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_captured, 42);
        assert_eq!(snap.commands_recognized, 1);
        assert!(metrics.last_command_time.read().is_some());
    }

    // Every snapshot field must track its live counter one-to-one.
    #[test]
    fn snapshot_covers_every_counter() {
        let metrics = PipelineMetrics::default();
        for (i, counter) in [
            &metrics.frames_captured,
            &metrics.classifier_errors,
            &metrics.finalize_send_failures,
            &metrics.sessions_finalized,
            &metrics.sessions_timed_out,
            &metrics.empty_finalizes,
            &metrics.transcription_failures,
            &metrics.commands_recognized,
            &metrics.commands_unmatched,
            &metrics.commands_rejected,
            &metrics.archive_failures,
        ]
        .iter()
        .enumerate()
        {
            counter.fetch_add(i as u64 + 1, Ordering::Relaxed);
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_captured, 1);
        assert_eq!(snap.classifier_errors, 2);
        assert_eq!(snap.finalize_send_failures, 3);
        assert_eq!(snap.sessions_finalized, 4);
        assert_eq!(snap.sessions_timed_out, 5);
        assert_eq!(snap.empty_finalizes, 6);
        assert_eq!(snap.transcription_failures, 7);
        assert_eq!(snap.commands_recognized, 8);
        assert_eq!(snap.commands_unmatched, 9);
        assert_eq!(snap.commands_rejected, 10);
        assert_eq!(snap.archive_failures, 11);
    }
}
