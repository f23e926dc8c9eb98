use tracing::warn;
use vosk::{CompleteResult, Model, Recognizer};

use voxarm_stt::{SttError, Transcriber, TranscriptionConfig};

pub struct VoskTranscriber {
    recognizer: Recognizer,
    config: TranscriptionConfig,
}

impl VoskTranscriber {
    /// Load the model and build a recognizer. Failure here is fatal to
    /// startup, not to a single session.
    pub fn new(config: TranscriptionConfig, sample_rate: f32) -> Result<Self, SttError> {
        // Vosk small models are trained for 16kHz input
        if (sample_rate - 16_000.0).abs() > 0.1 {
            warn!(
                "VoskTranscriber: sample rate {}Hz differs from expected 16000Hz; \
                 transcription quality may suffer",
                sample_rate
            );
        }

        if !std::path::Path::new(&config.model_path).exists() {
            return Err(SttError::ModelLoad(format!(
                "Vosk model not found at '{}'. Download a small English model from \
                 https://alphacephei.com/vosk/models and extract it there.",
                config.model_path
            )));
        }

        let model = Model::new(&config.model_path).ok_or_else(|| {
            SttError::ModelLoad(format!(
                "Failed to load Vosk model from: {}",
                config.model_path
            ))
        })?;

        let mut recognizer = Recognizer::new(&model, sample_rate).ok_or_else(|| {
            SttError::ModelLoad(format!(
                "Failed to create Vosk recognizer with sample rate: {}",
                sample_rate
            ))
        })?;

        recognizer.set_max_alternatives(config.max_alternatives as u16);
        recognizer.set_words(config.include_words);

        Ok(Self { recognizer, config })
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    fn extract_text(result: CompleteResult) -> Option<String> {
        let text = match result {
            CompleteResult::Single(single) => single.text.to_string(),
            CompleteResult::Multiple(multiple) => multiple
                .alternatives
                .first()
                .map(|alt| alt.text.to_string())
                .unwrap_or_default(),
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl Transcriber for VoskTranscriber {
    fn transcribe(&mut self, pcm: &[i16]) -> Result<Option<String>, SttError> {
        self.recognizer
            .accept_waveform(pcm)
            .map_err(|e| SttError::Decode(format!("Vosk waveform acceptance failed: {:?}", e)))?;

        // final_result() also clears recognizer state for the next utterance
        let result = self.recognizer.final_result();
        Ok(Self::extract_text(result))
    }
}
