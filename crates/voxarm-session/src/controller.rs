use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use voxarm_foundation::SharedClock;
use voxarm_stt::Transcriber;
use voxarm_telemetry::PipelineMetrics;

use crate::collaborators::{
    CommandDispatcher, DispatchOutcome, PromptCue, PromptPlayer, UtteranceSink,
};
use crate::command::CommandVocabulary;
use crate::config::{ControllerConfig, SessionConfig};
use crate::mode::{Mode, ModeFlag};
use crate::segmenter::{FinalizeReason, FinalizedUtterance};

/// Poll interval for interruptible waits. Short enough that shutdown feels
/// immediate, long enough to stay off the profiler.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum CycleOutcome {
    Continue,
    Stop,
}

/// Owns the prompt/listen/act loop and is the sole writer of the mode flag.
///
/// Runs on a dedicated control thread. Audio stays on its own callback
/// thread; the two meet only through [`ModeFlag`] and the finalize channel.
pub struct SessionController {
    mode: Arc<ModeFlag>,
    finalize_rx: Receiver<FinalizedUtterance>,
    transcriber: Box<dyn Transcriber>,
    prompts: Box<dyn PromptPlayer>,
    dispatcher: Box<dyn CommandDispatcher>,
    vocabulary: CommandVocabulary,
    session_cfg: SessionConfig,
    cfg: ControllerConfig,
    clock: SharedClock,
    running: Arc<AtomicBool>,
    archive: Option<Box<dyn UtteranceSink>>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mode: Arc<ModeFlag>,
        finalize_rx: Receiver<FinalizedUtterance>,
        transcriber: Box<dyn Transcriber>,
        prompts: Box<dyn PromptPlayer>,
        dispatcher: Box<dyn CommandDispatcher>,
        vocabulary: CommandVocabulary,
        session_cfg: SessionConfig,
        cfg: ControllerConfig,
        clock: SharedClock,
        shutdown_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            mode,
            finalize_rx,
            transcriber,
            prompts,
            dispatcher,
            vocabulary,
            session_cfg,
            cfg,
            clock,
            running: shutdown_flag,
            archive: None,
            metrics: None,
        }
    }

    pub fn with_archive(mut self, archive: Box<dyn UtteranceSink>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Main loop. Returns when shutdown is requested or the audio pipeline
    /// goes away.
    pub fn run(mut self) {
        info!("Session controller started");
        self.play_welcome_sequence();

        while !self.should_stop() {
            if let CycleOutcome::Stop = self.run_cycle() {
                break;
            }
        }

        self.mode.set(Mode::Idle);
        info!("Session controller stopped");
    }

    /// Startup sequence: greet, announce the stretch, run calibration, then
    /// explain usage. Prompt failures are logged and skipped so a broken
    /// speaker does not take the arm down with it.
    fn play_welcome_sequence(&mut self) {
        self.mode.set(Mode::PlayingPrompt);
        for cue in [PromptCue::Welcome, PromptCue::Stretch] {
            if let Err(e) = self.prompts.play(cue) {
                warn!(cue = cue.as_str(), "Prompt playback failed: {}", e);
            }
            if self.should_stop() {
                return;
            }
        }

        info!("Running startup calibration");
        if let Err(e) = self.dispatcher.calibrate() {
            error!("Startup calibration failed: {}", e);
        }

        if let Err(e) = self.prompts.play(PromptCue::Instructions) {
            warn!(
                cue = PromptCue::Instructions.as_str(),
                "Prompt playback failed: {}", e
            );
        }
        self.mode.set(Mode::Idle);
    }

    fn run_cycle(&mut self) -> CycleOutcome {
        self.mode.set(Mode::Idle);
        if !self.pause(self.cfg.inter_prompt_delay()) {
            return CycleOutcome::Stop;
        }

        self.mode.set(Mode::PlayingPrompt);
        if let Err(e) = self.prompts.play(PromptCue::CommandCue) {
            warn!("Command cue playback failed, skipping this cycle: {}", e);
            self.mode.set(Mode::Idle);
            return CycleOutcome::Continue;
        }

        self.mode.set(Mode::ListeningForCommand);
        let waited = self.wait_for_finalize();
        // Flip the mode before handling so the segmenter can re-arm while
        // transcription runs.
        self.mode.set(Mode::Idle);

        match waited {
            Ok(Some(utterance)) => {
                self.handle_finalize(utterance);
                CycleOutcome::Continue
            }
            Ok(None) => CycleOutcome::Continue,
            Err(()) => CycleOutcome::Stop,
        }
    }

    /// Interruptible sleep. Returns false if shutdown was requested.
    fn pause(&self, total: Duration) -> bool {
        let deadline = self.clock.now() + total;
        while self.clock.now() < deadline {
            if self.should_stop() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(self.clock.now());
            self.clock.sleep(remaining.min(POLL_INTERVAL));
        }
        !self.should_stop()
    }

    /// Block until the segmenter hands over a finalized utterance.
    ///
    /// `Ok(None)` means shutdown or a missed handoff window; `Err(())` means
    /// the sending side is gone and the controller must exit.
    fn wait_for_finalize(&self) -> Result<Option<FinalizedUtterance>, ()> {
        let total = self.session_cfg.max_command_duration() + self.cfg.finalize_wait_slack();
        let mut waited = Duration::ZERO;

        loop {
            match self.finalize_rx.recv_timeout(POLL_INTERVAL) {
                Ok(utterance) => return Ok(Some(utterance)),
                Err(RecvTimeoutError::Timeout) => {
                    if self.should_stop() {
                        return Ok(None);
                    }
                    waited += POLL_INTERVAL;
                    if waited >= total {
                        warn!(
                            waited_ms = waited.as_millis() as u64,
                            "No finalized utterance within the listening window; \
                             audio pipeline may be stalled"
                        );
                        return Ok(None);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!("Finalize channel disconnected; audio pipeline is gone");
                    return Err(());
                }
            }
        }
    }

    fn handle_finalize(&mut self, utterance: FinalizedUtterance) {
        match utterance.reason {
            FinalizeReason::SilenceAfterSpeech => {
                self.count(|m| &m.sessions_finalized);
            }
            FinalizeReason::Timeout => {
                self.count(|m| &m.sessions_timed_out);
            }
        }

        if utterance.samples.is_empty() {
            debug!(reason = ?utterance.reason, "Session ended without captured speech");
            self.count(|m| &m.empty_finalizes);
            return;
        }

        debug!(
            reason = ?utterance.reason,
            frames = utterance.captured_frames,
            "Handling finalized utterance"
        );

        if let Some(archive) = &mut self.archive {
            match archive.persist(&utterance.samples) {
                Ok(path) => debug!(path = %path.display(), "Utterance archived"),
                Err(e) => {
                    warn!("Failed to archive utterance: {}", e);
                    self.count(|m| &m.archive_failures);
                }
            }
        }

        let transcript = match self.transcriber.transcribe(&utterance.samples) {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("Transcription produced no text");
                return;
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                self.count(|m| &m.transcription_failures);
                return;
            }
        };
        info!(%transcript, "Utterance transcribed");

        let Some(command) = self.vocabulary.match_transcript(&transcript) else {
            info!(%transcript, "No command word in transcript");
            self.count(|m| &m.commands_unmatched);
            return;
        };

        if let Some(m) = &self.metrics {
            m.mark_command();
        }

        match self.dispatcher.dispatch(command) {
            Ok(DispatchOutcome::Executed) => {
                info!(command, "Command executed");
            }
            Ok(DispatchOutcome::Rejected { reason }) => {
                info!(command, %reason, "Command rejected");
                self.count(|m| &m.commands_rejected);
            }
            Err(e) => {
                warn!(command, "Command dispatch failed: {}", e);
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn count(
        &self,
        counter: impl Fn(&PipelineMetrics) -> &Arc<std::sync::atomic::AtomicU64>,
    ) {
        if let Some(m) = &self.metrics {
            counter(m).fetch_add(1, Ordering::Relaxed);
        }
    }
}
