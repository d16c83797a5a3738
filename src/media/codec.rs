use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::audio::{decode_wav, encode_wav, Pcm};
use crate::config::MediaConfig;
use crate::error::{Result, DubError};
use super::{ClipCodec, MediaCommandBuilder};

/// Clip codec backed by ffmpeg, with WAV handled in-process.
///
/// Every call works in its own scratch directory, removed when the call
/// returns or its future is dropped.
pub struct FfmpegClipCodec {
    command_builder: MediaCommandBuilder,
}

impl FfmpegClipCodec {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(&config.binary_path, &config.probe_binary_path),
        }
    }
}

#[async_trait]
impl ClipCodec for FfmpegClipCodec {
    async fn decode(&self, bytes: &[u8], sample_rate: u32) -> Result<Pcm> {
        if bytes.is_empty() {
            return Err(DubError::Synthesis("Empty audio clip".to_string()));
        }

        let scratch = tempfile::Builder::new().prefix("clip-").tempdir()?;
        let encoded = scratch.path().join("clip.bin");
        let wav = scratch.path().join("clip.wav");
        fs::write(&encoded, bytes).await?;

        self.command_builder
            .decode_clip(encoded.as_path(), wav.as_path(), sample_rate)
            .execute()
            .await?;

        let pcm = decode_wav(&fs::read(&wav).await?)?;
        if pcm.samples.is_empty() {
            return Err(DubError::Synthesis("Decoded clip has no samples".to_string()));
        }

        debug!("Decoded clip: {} bytes -> {} ms", bytes.len(), pcm.duration_ms());
        Ok(pcm)
    }

    async fn speed_up(&self, clip: &Pcm, factor: f64) -> Result<Pcm> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(DubError::Media(format!("Invalid speed-up factor: {}", factor)));
        }

        let scratch = tempfile::Builder::new().prefix("tempo-").tempdir()?;
        let input = scratch.path().join("in.wav");
        let output = scratch.path().join("out.wav");
        fs::write(&input, encode_wav(&clip.samples, clip.sample_rate)?).await?;

        self.command_builder
            .speed_up(input.as_path(), output.as_path(), factor)
            .execute()
            .await?;

        let pcm = decode_wav(&fs::read(&output).await?)?;
        debug!(
            "Time-compressed clip x{:.3}: {} ms -> {} ms",
            factor,
            clip.duration_ms(),
            pcm.duration_ms()
        );
        Ok(pcm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> FfmpegClipCodec {
        let mut config = crate::config::Config::default().media;
        config.binary_path = "/nonexistent/ffmpeg-binary".to_string();
        FfmpegClipCodec::new(config)
    }

    #[tokio::test]
    async fn test_decode_rejects_empty_bytes() {
        let err = codec().decode(&[], 24_000).await.unwrap_err();
        assert!(matches!(err, DubError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_speed_up_rejects_bad_factor() {
        let clip = Pcm::new(vec![0.0; 10], 24_000);
        assert!(matches!(codec().speed_up(&clip, 0.0).await, Err(DubError::Media(_))));
        assert!(matches!(codec().speed_up(&clip, f64::NAN).await, Err(DubError::Media(_))));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_surfaces_media_error() {
        let clip = Pcm::new(vec![0.1; 100], 24_000);
        let err = codec().speed_up(&clip, 1.5).await.unwrap_err();
        assert!(err.is_segment_local());
    }
}
