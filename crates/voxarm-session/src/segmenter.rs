use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use voxarm_foundation::SharedClock;
use voxarm_telemetry::PipelineMetrics;
use voxarm_vad::VadEngine;

use crate::config::SessionConfig;
use crate::mode::Mode;

/// Why a listening session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    /// Confirmed speech followed by the silence threshold.
    SilenceAfterSpeech,
    /// The session hit the maximum listening duration.
    Timeout,
}

/// A completed utterance, moved out of the segmenter at finalize time. The
/// buffer is owned, never aliased with the next session's.
#[derive(Debug)]
pub struct FinalizedUtterance {
    pub reason: FinalizeReason,
    /// All samples from the confirming speech frame through the last frame
    /// of the session. Empty if the session timed out before confirmation.
    pub samples: Vec<i16>,
    /// Number of frames in `samples`.
    pub captured_frames: u64,
}

/// Per-frame verdict of the segmenter.
#[derive(Debug)]
pub enum SegmenterOutcome {
    /// Not in a listening window; the frame only kept the classifier warm.
    Idle,
    /// Listening, speech not yet confirmed.
    AwaitingSpeech,
    /// Speech confirmed, frame buffered.
    Capturing,
    /// The session ended this frame; the buffer is handed over.
    Finalize(FinalizedUtterance),
}

/// State of one listening window. Owned exclusively by the segmenter, which
/// itself lives on the audio-callback thread.
struct ListeningSession {
    started_at: Instant,
    frame_buffer: Vec<i16>,
    captured_frames: u64,
    is_speaking: bool,
    voiced_run: u32,
    silence_run: u32,
}

impl ListeningSession {
    fn new(started_at: Instant, frame_size_samples: usize) -> Self {
        Self {
            started_at,
            // enough for a full-length session without reallocation
            frame_buffer: Vec::with_capacity(frame_size_samples * 256),
            captured_frames: 0,
            is_speaking: false,
            voiced_run: 0,
            silence_run: 0,
        }
    }

    fn capture(&mut self, frame: &[i16]) {
        self.frame_buffer.extend_from_slice(frame);
        self.captured_frames += 1;
    }
}

/// Drives the speech-start / speech-end state machine one frame at a time.
///
/// Runs on the real-time audio callback: no blocking, no I/O. The only thing
/// that leaves this struct is the finalized buffer, by move.
pub struct SpeechSegmenter {
    engine: Box<dyn VadEngine>,
    cfg: SessionConfig,
    clock: SharedClock,
    session: Option<ListeningSession>,
    /// Set when the mode has been observed outside `ListeningForCommand`
    /// since the last finalize. Prevents a second session from opening in
    /// the gap between emitting `Finalize` and the controller leaving
    /// listening mode.
    rearmed: bool,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl SpeechSegmenter {
    pub fn new(engine: Box<dyn VadEngine>, cfg: SessionConfig, clock: SharedClock) -> Self {
        Self {
            engine,
            cfg,
            clock,
            session: None,
            rearmed: true,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Process one PCM frame against a snapshot of the current mode.
    pub fn process_frame(&mut self, frame: &[i16], mode: Mode) -> SegmenterOutcome {
        if mode != Mode::ListeningForCommand {
            // Classify and discard so the classifier state stays warm for
            // the moment listening starts.
            self.warm_classify(frame);
            if self.session.take().is_some() {
                tracing::debug!("Listening session abandoned before finalize; buffer discarded");
            }
            self.rearmed = true;
            return SegmenterOutcome::Idle;
        }

        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                if !self.rearmed {
                    // Previous session already finalized; wait for the
                    // controller to cycle the mode before opening another.
                    self.warm_classify(frame);
                    return SegmenterOutcome::Idle;
                }
                tracing::debug!("Listening session opened");
                ListeningSession::new(self.clock.now(), self.cfg.frame_size_samples())
            }
        };

        // Hard cap first, independent of speech state.
        let elapsed = self.clock.now().duration_since(session.started_at);
        if elapsed > self.cfg.max_command_duration() {
            tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Command listening timed out, finalizing session"
            );
            return self.finalize(session, FinalizeReason::Timeout);
        }

        let is_speech = self.classify(frame);

        let outcome = if !session.is_speaking {
            if is_speech {
                session.voiced_run += 1;
                if session.voiced_run >= self.cfg.speech_confirm_frames {
                    // Buffering starts at the confirming frame; earlier
                    // frames are dropped in exchange for noise rejection.
                    session.is_speaking = true;
                    session.silence_run = 0;
                    session.capture(frame);
                    tracing::info!("Speech confirmed, capturing command");
                    SegmenterOutcome::Capturing
                } else {
                    SegmenterOutcome::AwaitingSpeech
                }
            } else {
                session.voiced_run = 0;
                SegmenterOutcome::AwaitingSpeech
            }
        } else {
            session.capture(frame);
            if is_speech {
                session.silence_run = 0;
                SegmenterOutcome::Capturing
            } else {
                session.silence_run += 1;
                if session.silence_run >= self.cfg.silence_confirm_frames() {
                    tracing::info!(
                        silence_ms = session.silence_run * self.cfg.frame_duration_ms,
                        "Silence after speech, finalizing session"
                    );
                    return self.finalize(session, FinalizeReason::SilenceAfterSpeech);
                }
                SegmenterOutcome::Capturing
            }
        };

        self.session = Some(session);
        outcome
    }

    fn finalize(&mut self, session: ListeningSession, reason: FinalizeReason) -> SegmenterOutcome {
        // session was taken by the caller; stay un-armed until the mode is
        // observed outside ListeningForCommand.
        self.rearmed = false;
        SegmenterOutcome::Finalize(FinalizedUtterance {
            reason,
            captured_frames: session.captured_frames,
            samples: session.frame_buffer,
        })
    }

    /// Classifier verdict with failure demoted to non-speech. A single bad
    /// frame must never abort the session.
    fn classify(&mut self, frame: &[i16]) -> bool {
        match self.engine.is_speech(frame) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("VAD classifier error, treating frame as non-speech: {}", e);
                if let Some(m) = &self.metrics {
                    m.classifier_errors.fetch_add(1, Ordering::Relaxed);
                }
                false
            }
        }
    }

    fn warm_classify(&mut self, frame: &[i16]) {
        if let Err(e) = self.engine.is_speech(frame) {
            tracing::debug!("VAD error during idle/prompt processing: {}", e);
            if let Some(m) = &self.metrics {
                m.classifier_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use voxarm_foundation::TestClock;
    use voxarm_vad::VadError;

    const FRAME: usize = 480;

    /// Engine that replays a scripted sequence of verdicts. `None` simulates
    /// a classifier failure.
    struct ScriptedVad {
        script: VecDeque<Option<bool>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedVad {
        fn new(script: impl IntoIterator<Item = Option<bool>>) -> Self {
            Self {
                script: script.into_iter().collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl voxarm_vad::VadEngine for ScriptedVad {
        fn is_speech(&mut self, _frame: &[i16]) -> Result<bool, VadError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match self.script.pop_front() {
                Some(Some(v)) => Ok(v),
                Some(None) => Err(VadError::Classify("scripted failure".into())),
                None => Ok(false),
            }
        }

        fn reset(&mut self) {}

        fn required_sample_rate(&self) -> u32 {
            16_000
        }

        fn required_frame_size_samples(&self) -> usize {
            FRAME
        }
    }

    fn frame_of(value: i16) -> Vec<i16> {
        vec![value; FRAME]
    }

    fn segmenter_with(
        script: impl IntoIterator<Item = Option<bool>>,
    ) -> (SpeechSegmenter, Arc<TestClock>) {
        let clock = Arc::new(TestClock::new());
        let seg = SpeechSegmenter::new(
            Box::new(ScriptedVad::new(script)),
            SessionConfig::default(),
            clock.clone(),
        );
        (seg, clock)
    }

    #[test]
    fn no_buffering_outside_listening_mode() {
        let (mut seg, _clock) = segmenter_with(std::iter::repeat(Some(true)).take(50));

        for _ in 0..25 {
            assert!(matches!(
                seg.process_frame(&frame_of(1000), Mode::Idle),
                SegmenterOutcome::Idle
            ));
            assert!(matches!(
                seg.process_frame(&frame_of(1000), Mode::PlayingPrompt),
                SegmenterOutcome::Idle
            ));
        }
        assert!(seg.session.is_none());
    }

    #[test]
    fn classifier_stays_warm_outside_listening() {
        let clock = Arc::new(TestClock::new());
        let engine = ScriptedVad::new(std::iter::repeat(Some(false)).take(10));
        let calls = engine.calls.clone();
        let mut seg = SpeechSegmenter::new(Box::new(engine), SessionConfig::default(), clock);

        for _ in 0..10 {
            seg.process_frame(&frame_of(0), Mode::Idle);
        }
        // Every frame reached the classifier even though nothing was buffered.
        assert_eq!(calls.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn speech_confirm_requires_consecutive_frames() {
        // 2 speech, 1 non-speech, then 2 speech: never reaches threshold 3
        let (mut seg, _clock) = segmenter_with([
            Some(true),
            Some(true),
            Some(false),
            Some(true),
            Some(true),
        ]);

        for _ in 0..5 {
            assert!(matches!(
                seg.process_frame(&frame_of(1000), Mode::ListeningForCommand),
                SegmenterOutcome::AwaitingSpeech
            ));
        }
        let session = seg.session.as_ref().unwrap();
        assert!(!session.is_speaking);
        assert!(session.frame_buffer.is_empty());
        // run counter was reset by the non-speech frame, then counted 2 again
        assert_eq!(session.voiced_run, 2);
    }

    #[test]
    fn silence_run_resets_on_speech_frame() {
        let silence_frames = SessionConfig::default().silence_confirm_frames() as usize;
        // confirm speech (3), then M-1 silence, one speech, then full silence
        let script = std::iter::repeat(Some(true))
            .take(3)
            .chain(std::iter::repeat(Some(false)).take(silence_frames - 1))
            .chain(std::iter::once(Some(true)))
            .chain(std::iter::repeat(Some(false)).take(silence_frames));
        let (mut seg, _clock) = segmenter_with(script);

        let mut finalized = 0;
        let total = 3 + (silence_frames - 1) + 1 + silence_frames;
        for i in 0..total {
            match seg.process_frame(&frame_of(1), Mode::ListeningForCommand) {
                SegmenterOutcome::Finalize(u) => {
                    finalized += 1;
                    assert_eq!(u.reason, FinalizeReason::SilenceAfterSpeech);
                    // finalize only on the very last frame
                    assert_eq!(i, total - 1);
                }
                SegmenterOutcome::Capturing | SegmenterOutcome::AwaitingSpeech => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(finalized, 1);
    }

    #[test]
    fn end_to_end_silence_finalize_buffers_from_confirming_frame() {
        // Spec scenario: 2 non-speech, 3 speech (threshold 3), 17 silence.
        let cfg = SessionConfig::default();
        let silence_frames = cfg.silence_confirm_frames() as usize;
        assert_eq!(silence_frames, 17);

        let script = std::iter::repeat(Some(false))
            .take(2)
            .chain(std::iter::repeat(Some(true)).take(3))
            .chain(std::iter::repeat(Some(false)).take(silence_frames));
        let (mut seg, _clock) = segmenter_with(script);

        let mut utterance = None;
        for i in 0..(2 + 3 + silence_frames) {
            // tag each frame with its index so buffer content is checkable
            let frame = frame_of(i as i16);
            match seg.process_frame(&frame, Mode::ListeningForCommand) {
                SegmenterOutcome::Finalize(u) => {
                    assert!(utterance.is_none(), "finalized more than once");
                    utterance = Some(u);
                }
                _ => {}
            }
        }

        let utterance = utterance.expect("expected exactly one finalize");
        assert_eq!(utterance.reason, FinalizeReason::SilenceAfterSpeech);
        // Buffer holds the confirming (3rd) speech frame through all 17
        // silence frames: frames 4..=21, i.e. 18 frames.
        assert_eq!(utterance.captured_frames, (1 + silence_frames) as u64);
        assert_eq!(utterance.samples.len(), (1 + silence_frames) * FRAME);
        assert_eq!(utterance.samples[0], 4);
        assert_eq!(*utterance.samples.last().unwrap(), (2 + 3 + 17 - 1) as i16);
    }

    #[test]
    fn timeout_finalizes_even_with_empty_buffer() {
        let (mut seg, clock) = segmenter_with(std::iter::repeat(Some(false)).take(300));

        // open the session
        assert!(matches!(
            seg.process_frame(&frame_of(0), Mode::ListeningForCommand),
            SegmenterOutcome::AwaitingSpeech
        ));

        clock.advance(Duration::from_millis(5_001));
        match seg.process_frame(&frame_of(0), Mode::ListeningForCommand) {
            SegmenterOutcome::Finalize(u) => {
                assert_eq!(u.reason, FinalizeReason::Timeout);
                assert!(u.samples.is_empty());
                assert_eq!(u.captured_frames, 0);
            }
            other => panic!("expected timeout finalize, got {:?}", other),
        }
    }

    #[test]
    fn timeout_applies_mid_speech() {
        let (mut seg, clock) = segmenter_with(std::iter::repeat(Some(true)).take(300));

        for _ in 0..10 {
            seg.process_frame(&frame_of(7), Mode::ListeningForCommand);
        }
        assert!(seg.session.as_ref().unwrap().is_speaking);

        clock.advance(Duration::from_secs(6));
        match seg.process_frame(&frame_of(7), Mode::ListeningForCommand) {
            SegmenterOutcome::Finalize(u) => {
                assert_eq!(u.reason, FinalizeReason::Timeout);
                // 3rd through 10th frame were buffered before the timeout
                assert_eq!(u.captured_frames, 8);
                assert_eq!(u.samples.len(), 8 * FRAME);
            }
            other => panic!("expected timeout finalize, got {:?}", other),
        }
    }

    #[test]
    fn no_new_session_until_mode_cycles_after_finalize() {
        let (mut seg, clock) = segmenter_with(std::iter::repeat(Some(true)).take(300));

        seg.process_frame(&frame_of(0), Mode::ListeningForCommand);
        clock.advance(Duration::from_secs(6));
        assert!(matches!(
            seg.process_frame(&frame_of(0), Mode::ListeningForCommand),
            SegmenterOutcome::Finalize(_)
        ));

        // Mode still reads ListeningForCommand: the segmenter must idle.
        for _ in 0..5 {
            assert!(matches!(
                seg.process_frame(&frame_of(0), Mode::ListeningForCommand),
                SegmenterOutcome::Idle
            ));
        }

        // Controller cycles through idle, then a new window may open.
        seg.process_frame(&frame_of(0), Mode::Idle);
        assert!(matches!(
            seg.process_frame(&frame_of(0), Mode::ListeningForCommand),
            SegmenterOutcome::AwaitingSpeech
        ));
    }

    #[test]
    fn classifier_failure_counts_as_non_speech() {
        // two clean speech frames, an error, then more speech: the error
        // must reset the confirm run, not kill the session
        let script = [Some(true), Some(true), None, Some(true), Some(true), Some(true)];
        let (mut seg, _clock) = segmenter_with(script);

        for _ in 0..5 {
            seg.process_frame(&frame_of(1), Mode::ListeningForCommand);
        }
        assert!(!seg.session.as_ref().unwrap().is_speaking);

        // 6th frame completes a fresh run of 3
        assert!(matches!(
            seg.process_frame(&frame_of(1), Mode::ListeningForCommand),
            SegmenterOutcome::Capturing
        ));
        assert!(seg.session.as_ref().unwrap().is_speaking);
    }

    #[test]
    fn abandoned_session_discards_buffer() {
        let (mut seg, _clock) = segmenter_with(std::iter::repeat(Some(true)).take(50));

        for _ in 0..5 {
            seg.process_frame(&frame_of(9), Mode::ListeningForCommand);
        }
        assert!(!seg.session.as_ref().unwrap().frame_buffer.is_empty());

        // Mode leaves listening without a finalize: session is dropped.
        seg.process_frame(&frame_of(9), Mode::Idle);
        assert!(seg.session.is_none());

        // Next window starts from scratch.
        assert!(matches!(
            seg.process_frame(&frame_of(9), Mode::ListeningForCommand),
            SegmenterOutcome::AwaitingSpeech
        ));
        assert!(seg.session.as_ref().unwrap().frame_buffer.is_empty());
    }
}
