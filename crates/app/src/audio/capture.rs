use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::bounded;

use voxarm_foundation::AudioError;
use voxarm_vad::constants::SAMPLE_RATE_HZ;

use super::pipeline::CallbackPipeline;

/// Owns the cpal input stream on a dedicated thread.
///
/// cpal streams are not `Send`, so the stream is built and dropped entirely
/// inside the capture thread; the handle only carries the stop flag.
pub struct AudioCaptureThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AudioCaptureThread {
    /// Start capturing. Blocks until the stream is live or failed to open;
    /// a device that cannot do 16 kHz is a startup failure, not something to
    /// resample around.
    pub fn spawn(
        device_name: Option<String>,
        pipeline: CallbackPipeline,
    ) -> Result<Self, AudioError> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                capture_loop(device_name, pipeline, thread_running, move |result| {
                    let _ = ready_tx.send(result);
                });
            })
            .map_err(|e| AudioError::Fatal(format!("cannot spawn capture thread: {}", e)))?;

        match ready_rx.recv_timeout(Duration::from_secs(10)) {
            Ok(Ok(())) => Ok(Self {
                running,
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(AudioError::Fatal(
                    "capture thread did not report readiness".to_string(),
                ))
            }
        }
    }

    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioCaptureThread {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn capture_loop(
    device_name: Option<String>,
    pipeline: CallbackPipeline,
    running: Arc<AtomicBool>,
    report_ready: impl FnOnce(Result<(), AudioError>),
) {
    let stream = match open_stream(device_name, pipeline) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Failed to open audio input: {}", e);
            report_ready(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        report_ready(Err(e.into()));
        return;
    }
    tracing::info!("Audio capture started");
    report_ready(Ok(()));

    // The stream runs on cpal's own threads; this one just keeps it alive.
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    drop(stream);
    tracing::info!("Audio capture stopped");
}

fn open_stream(
    device_name: Option<String>,
    mut pipeline: CallbackPipeline,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = select_device(&host, device_name.as_deref())?;
    tracing::info!(
        device = device.name().unwrap_or_else(|_| "unknown".to_string()),
        "Opening audio input device"
    );

    let (config, sample_format) = negotiate_config(&device)?;
    tracing::info!(
        sample_rate = config.sample_rate.0,
        channels = config.channels,
        format = ?sample_format,
        "Negotiated capture config"
    );

    let channels = config.channels;
    let err_fn = |err| {
        tracing::error!("Audio stream error: {}", err);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                pipeline.handle_samples(data, channels);
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => {
            let mut scratch: Vec<i16> = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(
                        data.iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                    );
                    pipeline.handle_samples(&scratch, channels);
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::U16 => {
            let mut scratch: Vec<i16> = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| (s as i32 - 32_768) as i16));
                    pipeline.handle_samples(&scratch, channels);
                },
                err_fn,
                None,
            )?
        }
        other => {
            return Err(AudioError::FormatNotSupported {
                format: format!("{:?}", other),
            })
        }
    };

    Ok(stream)
}

fn select_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, AudioError> {
    match name {
        Some(fragment) => {
            for device in host.input_devices()? {
                if let Ok(device_name) = device.name() {
                    if device_name.contains(fragment) {
                        return Ok(device);
                    }
                }
            }
            Err(AudioError::DeviceNotFound {
                name: Some(fragment.to_string()),
            })
        }
        None => host
            .default_input_device()
            .ok_or(AudioError::DeviceNotFound { name: None }),
    }
}

/// Find a supported config that can deliver 16 kHz. The classifier and the
/// speech model are both fixed at that rate, so anything else is refused.
fn negotiate_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), AudioError> {
    for supported in device.supported_input_configs()? {
        if supported.min_sample_rate().0 <= SAMPLE_RATE_HZ
            && supported.max_sample_rate().0 >= SAMPLE_RATE_HZ
        {
            let sample_format = supported.sample_format();
            let config = StreamConfig {
                channels: supported.channels(),
                sample_rate: cpal::SampleRate(SAMPLE_RATE_HZ),
                buffer_size: cpal::BufferSize::Default,
            };
            return Ok((config, sample_format));
        }
    }

    Err(AudioError::FormatNotSupported {
        format: format!("device cannot capture at {} Hz", SAMPLE_RATE_HZ),
    })
}
