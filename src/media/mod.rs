// Modular media processing architecture
//
// This module provides a clean abstraction over media processing operations:
// - Processor: container-level work (probe, extract, remux) via ffmpeg/ffprobe
// - Codec: per-clip decode and time compression for the timeline
// - Commands: Command builders and abstractions

pub mod codec;
pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use codec::*;
pub use commands::*;
pub use processor::*;

use crate::audio::Pcm;
use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Duration of a media file in seconds
    async fn probe_duration(&self, media_path: &Path) -> Result<f64>;

    /// Extract transcriber-ready audio from video
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<()>;

    /// Replace the audio stream of `video_path` with `audio_path`
    async fn remux(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;
}

/// Per-clip audio operations used while scheduling synthesized speech
#[async_trait]
pub trait ClipCodec: Send + Sync {
    /// Decode encoded audio into mono PCM at `sample_rate`
    async fn decode(&self, bytes: &[u8], sample_rate: u32) -> Result<Pcm>;

    /// Compress `clip` in time by `factor` (> 1.0 is faster)
    async fn speed_up(&self, clip: &Pcm, factor: f64) -> Result<Pcm>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }

    /// Create the default clip codec (FFmpeg-based)
    pub fn create_codec(config: MediaConfig) -> Box<dyn ClipCodec> {
        Box::new(codec::FfmpegClipCodec::new(config))
    }
}
