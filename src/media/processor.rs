use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::config::MediaConfig;
use crate::error::{Result, DubError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

/// Parse the single number ffprobe prints for `format=duration`.
pub fn parse_probe_output(stdout: &[u8]) -> Result<f64> {
    let text = String::from_utf8_lossy(stdout);
    let value = text.trim();
    let seconds: f64 = value
        .parse()
        .map_err(|_| DubError::Probe(format!("Unexpected duration output: {:?}", value)))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DubError::Probe(format!("Invalid duration: {}", seconds)));
    }
    Ok(seconds)
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe_duration(&self, media_path: &Path) -> Result<f64> {
        let stdout = self.command_builder.probe_duration(media_path).execute().await?;
        let seconds = parse_probe_output(&stdout)?;
        info!("Probed duration of {}: {:.3}s", media_path.display(), seconds);
        Ok(seconds)
    }

    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder.extract_audio(video_path, audio_path).execute().await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn remux(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Remuxing {} with {} -> {}",
              video_path.display(), audio_path.display(), output_path.display());

        self.command_builder
            .remux(video_path, audio_path, output_path, &self.config.audio_codec)
            .execute()
            .await?;

        if !output_path.exists() {
            return Err(DubError::Mux(format!(
                "Remux reported success but {} is missing",
                output_path.display()
            )));
        }

        info!("Remux completed successfully");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = std::process::Command::new(&self.config.binary_path)
            .args(&self.command_builder.version_check().args)
            .output()
            .map_err(|e| DubError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(DubError::Media("Media processor version check failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_probe_output(b"12.480000\n").unwrap(), 12.48);
        assert!(matches!(parse_probe_output(b"N/A\n"), Err(DubError::Probe(_))));
        assert!(matches!(parse_probe_output(b"0.000000"), Err(DubError::Probe(_))));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let mut config = crate::config::Config::default().media;
        config.binary_path = "/nonexistent/ffmpeg-binary".to_string();
        let processor = MediaProcessorImpl::new(config);
        assert!(processor.check_availability().is_err());
    }
}
