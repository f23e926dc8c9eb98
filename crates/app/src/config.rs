use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use voxarm_foundation::AppError;
use voxarm_session::{ControllerConfig, SessionConfig};
use voxarm_stt::TranscriptionConfig;
use voxarm_vad::{Aggressiveness, VadConfig};

/// Command-line overrides. Everything here also lives in the TOML config;
/// flags win over the file.
#[derive(Debug, Parser)]
#[command(name = "voxarm", about = "Voice-controlled robot arm")]
pub struct CliArgs {
    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input device name (substring match); default input device if unset
    #[arg(long)]
    pub device: Option<String>,

    /// Path to the speech model directory
    #[arg(long)]
    pub model_path: Option<String>,

    /// Directory holding the prompt WAV files
    #[arg(long)]
    pub prompts_dir: Option<PathBuf>,

    /// Directory for archived command recordings
    #[arg(long)]
    pub recordings_dir: Option<PathBuf>,

    /// VAD aggressiveness, 0 (quality) to 3 (very aggressive)
    #[arg(long)]
    pub vad_aggressiveness: Option<u8>,

    /// Disable the WAV archive of captured commands
    #[arg(long)]
    pub no_archive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input device name; `None` picks the system default input.
    pub device: Option<String>,
    pub prompts_dir: PathBuf,
    pub recordings_dir: PathBuf,
    /// Write each captured command to a WAV file for offline inspection.
    pub archive_utterances: bool,
    pub vad: VadConfig,
    pub stt: TranscriptionConfig,
    pub session: SessionConfig,
    pub controller: ControllerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: None,
            prompts_dir: PathBuf::from("prompts"),
            recordings_dir: PathBuf::from("recordings"),
            archive_utterances: true,
            vad: VadConfig::default(),
            stt: TranscriptionConfig::default(),
            session: SessionConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

const DEFAULT_CONFIG_FILE: &str = "voxarm.toml";

impl AppConfig {
    /// Resolve the effective config: file (explicit path, or `voxarm.toml`
    /// next to the binary if present), then CLI overrides on top.
    pub fn resolve(args: &CliArgs) -> Result<Self, AppError> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(device) = &args.device {
            cfg.device = Some(device.clone());
        }
        if let Some(model_path) = &args.model_path {
            cfg.stt.model_path = model_path.clone();
        }
        if let Some(dir) = &args.prompts_dir {
            cfg.prompts_dir = dir.clone();
        }
        if let Some(dir) = &args.recordings_dir {
            cfg.recordings_dir = dir.clone();
        }
        if let Some(level) = args.vad_aggressiveness {
            cfg.vad.aggressiveness = Aggressiveness::try_from(level)
                .map_err(|e| AppError::Config(e.to_string()))?;
        }
        if args.no_archive {
            cfg.archive_utterances = false;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("invalid config {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_command_loop_expectations() {
        let cfg = AppConfig::default();
        assert!(cfg.archive_utterances);
        assert_eq!(cfg.vad.sample_rate_hz, 16_000);
        assert_eq!(cfg.session.frame_size_samples(), 480);
        assert_eq!(cfg.prompts_dir, PathBuf::from("prompts"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxarm.toml");
        std::fs::write(
            &path,
            r#"
device = "USB Audio"
archive_utterances = false

[session]
max_command_duration_ms = 4000
"#,
        )
        .unwrap();

        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.device.as_deref(), Some("USB Audio"));
        assert!(!cfg.archive_utterances);
        assert_eq!(cfg.session.max_command_duration_ms, 4_000);
        // untouched sections keep their defaults
        assert_eq!(cfg.session.speech_confirm_frames, 3);
        assert_eq!(cfg.controller.inter_prompt_delay_ms, 3_000);
    }

    #[test]
    fn cli_overrides_beat_the_file() {
        let args = CliArgs {
            config: None,
            device: Some("mic".into()),
            model_path: Some("/opt/model".into()),
            prompts_dir: None,
            recordings_dir: None,
            vad_aggressiveness: Some(3),
            no_archive: true,
        };
        let cfg = AppConfig::resolve(&args).unwrap();
        assert_eq!(cfg.device.as_deref(), Some("mic"));
        assert_eq!(cfg.stt.model_path, "/opt/model");
        assert_eq!(u8::from(cfg.vad.aggressiveness), 3);
        assert!(!cfg.archive_utterances);
    }

    #[test]
    fn bad_aggressiveness_is_a_config_error() {
        let args = CliArgs {
            config: None,
            device: None,
            model_path: None,
            prompts_dir: None,
            recordings_dir: None,
            vad_aggressiveness: Some(7),
            no_archive: false,
        };
        assert!(matches!(
            AppConfig::resolve(&args),
            Err(AppError::Config(_))
        ));
    }
}
