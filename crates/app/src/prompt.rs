//! Prompt cue loading and playback.
//!
//! All cue WAVs are decoded once at startup so a missing or corrupt file
//! fails the launch instead of a session. Playback runs on a dedicated
//! thread because the audio output stream cannot leave the thread that
//! created it; the controller talks to it through a small `Send` client.

use std::collections::HashMap;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};

use voxarm_foundation::AppError;
use voxarm_session::{PromptCue, PromptError, PromptPlayer};

const ALL_CUES: [PromptCue; 4] = [
    PromptCue::Welcome,
    PromptCue::Stretch,
    PromptCue::Instructions,
    PromptCue::CommandCue,
];

fn cue_file_name(cue: PromptCue) -> &'static str {
    match cue {
        PromptCue::Welcome => "welcome.wav",
        PromptCue::Stretch => "stretch.wav",
        PromptCue::Instructions => "instructions.wav",
        PromptCue::CommandCue => "keys.wav",
    }
}

#[derive(Clone)]
struct Clip {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

/// All prompt cues, decoded and resident in memory.
pub struct PromptLibrary {
    clips: HashMap<PromptCue, Clip>,
}

impl PromptLibrary {
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let mut clips = HashMap::new();
        for cue in ALL_CUES {
            let path = dir.join(cue_file_name(cue));
            let clip = load_clip(&path).map_err(|e| {
                AppError::MissingResource(format!(
                    "prompt '{}' at {}: {}",
                    cue.as_str(),
                    path.display(),
                    e
                ))
            })?;
            tracing::debug!(
                cue = cue.as_str(),
                samples = clip.samples.len(),
                sample_rate = clip.sample_rate,
                "Loaded prompt cue"
            );
            clips.insert(cue, clip);
        }
        Ok(Self { clips })
    }
}

fn load_clip(path: &Path) -> Result<Clip, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => {
            reader.into_samples::<f32>().collect::<Result<_, _>>()?
        }
    };
    Ok(Clip {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        samples,
    })
}

struct PlayRequest {
    cue: PromptCue,
    done: Sender<Result<(), PromptError>>,
}

/// Owns the playback thread. Dropping it (after all clients) ends the thread.
pub struct PromptService {
    tx: Sender<PlayRequest>,
    handle: Option<JoinHandle<()>>,
}

/// `Send` handle the controller uses to play cues. Each call blocks until
/// the cue has finished.
pub struct PromptServiceClient {
    tx: Sender<PlayRequest>,
}

impl PromptService {
    /// Open the default output device and start serving cues. Blocks until
    /// the output stream is live; failure here is a startup failure.
    pub fn spawn(library: PromptLibrary) -> Result<Self, AppError> {
        let (tx, rx) = bounded::<PlayRequest>(2);
        let (ready_tx, ready_rx) = bounded::<Result<(), AppError>>(1);

        let handle = thread::Builder::new()
            .name("prompt-playback".to_string())
            .spawn(move || playback_loop(library, rx, ready_tx))
            .map_err(|e| AppError::Fatal(format!("cannot spawn playback thread: {}", e)))?;

        match ready_rx.recv_timeout(Duration::from_secs(10)) {
            Ok(Ok(())) => Ok(Self {
                tx,
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => Err(AppError::Fatal(
                "playback thread did not report readiness".to_string(),
            )),
        }
    }

    pub fn client(&self) -> PromptServiceClient {
        PromptServiceClient {
            tx: self.tx.clone(),
        }
    }
}

impl Drop for PromptService {
    fn drop(&mut self) {
        // Disconnect the service's own sender so the thread can exit once
        // the last client hangs up.
        let (replacement, _) = bounded(1);
        drop(std::mem::replace(&mut self.tx, replacement));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn playback_loop(
    library: PromptLibrary,
    rx: Receiver<PlayRequest>,
    ready_tx: Sender<Result<(), AppError>>,
) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(AppError::Fatal(format!(
                "cannot open audio output: {}",
                e
            ))));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));
    tracing::info!("Prompt playback ready");

    while let Ok(request) = rx.recv() {
        let result = match library.clips.get(&request.cue) {
            Some(clip) => {
                tracing::debug!(cue = request.cue.as_str(), "Playing prompt cue");
                let sink = Sink::connect_new(stream.mixer());
                sink.append(SamplesBuffer::new(
                    clip.channels,
                    clip.sample_rate,
                    clip.samples.clone(),
                ));
                sink.sleep_until_end();
                Ok(())
            }
            None => Err(PromptError::Playback {
                cue: request.cue.as_str(),
                detail: "cue not loaded".to_string(),
            }),
        };
        let _ = request.done.send(result);
    }
    tracing::debug!("Prompt playback thread exiting");
}

impl PromptPlayer for PromptServiceClient {
    fn play(&mut self, cue: PromptCue) -> Result<(), PromptError> {
        let (done_tx, done_rx) = bounded(1);
        self.tx
            .send(PlayRequest { cue, done: done_tx })
            .map_err(|_| PromptError::OutputUnavailable("playback thread gone".to_string()))?;
        done_rx
            .recv()
            .map_err(|_| PromptError::OutputUnavailable("playback thread gone".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn load_fails_when_a_cue_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("welcome.wav"), &[0; 100]);
        // stretch.wav, instructions.wav, keys.wav absent

        match PromptLibrary::load(dir.path()) {
            Err(AppError::MissingResource(msg)) => {
                assert!(msg.contains("stretch"), "unexpected message: {msg}");
            }
            other => panic!("expected missing resource error, got {:?}", other.err()),
        }
    }

    #[test]
    fn all_cues_load_and_decode() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["welcome.wav", "stretch.wav", "instructions.wav", "keys.wav"] {
            write_wav(&dir.path().join(name), &[i16::MAX / 2; 160]);
        }

        let library = PromptLibrary::load(dir.path()).unwrap();
        for cue in ALL_CUES {
            let clip = library.clips.get(&cue).unwrap();
            assert_eq!(clip.sample_rate, 16_000);
            assert_eq!(clip.samples.len(), 160);
            assert!((clip.samples[0] - 0.5).abs() < 0.01);
        }
    }
}
