//! Assembles the pipeline: capture thread feeding the segmenter, control
//! thread running the prompt/listen/act loop, and the main task watching for
//! shutdown.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;

use voxarm_arm::{ArmDispatcher, LoggingArmDriver};
use voxarm_foundation::{real_clock, AppError, ShutdownHandler, ShutdownToken};
use voxarm_session::{
    CommandVocabulary, FinalizedUtterance, ModeFlag, SessionController, SpeechSegmenter,
};
use voxarm_stt::Transcriber;
use voxarm_telemetry::PipelineMetrics;
use voxarm_vad_webrtc::WebRtcVadEngine;

use crate::archive::WavArchive;
use crate::audio::{AudioCaptureThread, CallbackPipeline, FrameChunker};
use crate::config::AppConfig;
use crate::prompt::{PromptLibrary, PromptService};

/// Depth of the finalize handoff queue. One entry per listening window is
/// the steady state; headroom covers a slow transcription.
const FINALIZE_QUEUE_DEPTH: usize = 8;

const STATS_INTERVAL: Duration = Duration::from_secs(30);

pub async fn run(cfg: AppConfig) -> Result<(), AppError> {
    let shutdown = ShutdownHandler::new().install();
    let metrics = Arc::new(PipelineMetrics::default());
    let mode = Arc::new(ModeFlag::default());
    let (finalize_tx, finalize_rx) = bounded::<FinalizedUtterance>(FINALIZE_QUEUE_DEPTH);

    // Prompt cues decode up front: a missing WAV or a dead output device is
    // a launch failure, not something to discover mid-session.
    let library = PromptLibrary::load(&cfg.prompts_dir)?;
    let prompt_service = PromptService::spawn(library)?;

    let transcriber = build_transcriber(&cfg)?;

    let segmenter = SpeechSegmenter::new(
        Box::new(WebRtcVadEngine::new(&cfg.vad)),
        cfg.session.clone(),
        real_clock(),
    )
    .with_metrics(metrics.clone());
    let pipeline = CallbackPipeline::new(
        FrameChunker::new(cfg.session.frame_size_samples()),
        segmenter,
        mode.clone(),
        finalize_tx,
        metrics.clone(),
    );
    let capture = AudioCaptureThread::spawn(cfg.device.clone(), pipeline)?;

    let dispatcher = ArmDispatcher::new(Box::new(LoggingArmDriver), Box::new(LoggingArmDriver));

    let mut controller = SessionController::new(
        mode,
        finalize_rx,
        transcriber,
        Box::new(prompt_service.client()),
        Box::new(dispatcher),
        CommandVocabulary::default_set(),
        cfg.session.clone(),
        cfg.controller.clone(),
        real_clock(),
        shutdown.flag(),
    )
    .with_metrics(metrics.clone());
    if cfg.archive_utterances {
        controller = controller.with_archive(Box::new(WavArchive::new(
            cfg.recordings_dir.clone(),
            cfg.session.sample_rate_hz,
        )));
    }

    let controller_handle = spawn_controller(controller, shutdown.clone())?;
    tracing::info!("Pipeline running");

    let mut stats_interval = tokio::time::interval(STATS_INTERVAL);
    stats_interval.tick().await; // consume the immediate first tick
    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = stats_interval.tick() => {
                let snap = metrics.snapshot();
                tracing::info!(?snap, "Pipeline stats");
            }
        }
    }

    tracing::info!("Beginning graceful shutdown");
    // Stop the audio source first so no new utterances arrive, then wait
    // for the control loop to wind down, then release the speaker.
    capture.stop();
    let _ = controller_handle.join();
    drop(prompt_service);
    tracing::info!("Shutdown complete");
    Ok(())
}

fn spawn_controller(
    controller: SessionController,
    shutdown: ShutdownToken,
) -> Result<thread::JoinHandle<()>, AppError> {
    thread::Builder::new()
        .name("session-control".to_string())
        .spawn(move || {
            controller.run();
            // If the control loop dies on its own (e.g. the finalize channel
            // disconnected), take the whole app down with it.
            shutdown.trigger();
        })
        .map_err(|e| AppError::Fatal(format!("cannot spawn control thread: {}", e)))
}

#[cfg(feature = "vosk")]
fn build_transcriber(cfg: &AppConfig) -> Result<Box<dyn Transcriber>, AppError> {
    let transcriber =
        voxarm_stt_vosk::VoskTranscriber::new(cfg.stt.clone(), cfg.vad.sample_rate_hz as f32)
            .map_err(|e| AppError::Fatal(e.to_string()))?;
    Ok(Box::new(transcriber))
}

#[cfg(not(feature = "vosk"))]
fn build_transcriber(_cfg: &AppConfig) -> Result<Box<dyn Transcriber>, AppError> {
    tracing::warn!("Built without the 'vosk' feature; spoken commands will not be recognized");
    Ok(Box::new(voxarm_stt::NoopTranscriber))
}
