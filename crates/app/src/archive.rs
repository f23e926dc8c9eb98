use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use hound::{SampleFormat, WavSpec, WavWriter};

use voxarm_session::UtteranceSink;

/// Writes each captured command to its own timestamped WAV file so
/// recognition problems can be replayed offline.
pub struct WavArchive {
    dir: PathBuf,
    sample_rate: u32,
}

impl WavArchive {
    pub fn new(dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            sample_rate,
        }
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S%.3f");
        self.dir.join(format!("command_{}.wav", stamp))
    }

    fn write(&self, path: &Path, samples: &[i16]) -> Result<(), hound::Error> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

impl UtteranceSink for WavArchive {
    fn persist(&mut self, samples: &[i16]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        self.write(&path, samples)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(path)
    }
}
