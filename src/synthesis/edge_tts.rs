use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::SynthesisConfig;
use crate::error::{Result, DubError};
use crate::segment::VoiceId;
use super::SpeechSynthesizer;

/// Runs the `edge-tts` command line client and returns the MP3 it writes.
pub struct EdgeTtsSynthesizer {
    config: SynthesisConfig,
}

impl EdgeTtsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Text is passed as `--text=...` so a leading `-` is never read as an option.
    fn command(&self, text: &str, voice: &VoiceId, media_path: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("--voice").arg(voice.as_str())
            .arg(format!("--text={}", text))
            .arg("--write-media").arg(media_path)
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceId) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(DubError::Synthesis("Nothing to synthesize".to_string()));
        }

        let media = tempfile::Builder::new()
            .prefix("tts-")
            .suffix(".mp3")
            .tempfile()?;

        let mut cmd = self.command(text, voice, media.path());

        debug!("Executing edge-tts command: {:?}", cmd);

        let output = cmd.output().await
            .map_err(|e| DubError::Synthesis(format!("Failed to execute edge-tts: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Synthesis(format!(
                "edge-tts failed for voice {}: {}",
                voice,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(media.path()).await?;
        if bytes.is_empty() {
            return Err(DubError::Synthesis("edge-tts produced no audio".to_string()));
        }

        debug!("Synthesized {} bytes with voice {}", bytes.len(), voice);
        Ok(bytes)
    }
}
