use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, DubError};
use crate::segment::TranscriptSegment;
use crate::setup::ModelManager;
use super::{Transcriber, TranscriberLoader, TranscriptStream};

// Structs for parsing whisper.cpp JSON output (`-oj`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    pub result: Option<WhisperCppResult>,
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: i64,
    pub to: i64,
}

impl From<WhisperCppOutput> for Vec<TranscriptSegment> {
    fn from(output: WhisperCppOutput) -> Self {
        output.transcription
            .into_iter()
            .map(|seg| TranscriptSegment {
                start: seg.offsets.from.max(0) as f64 / 1000.0, // Convert ms to seconds
                end: seg.offsets.to.max(0) as f64 / 1000.0,
                raw_text: seg.text.trim().to_string(),
            })
            .collect()
    }
}

/// whisper.cpp command line transcriber bound to one resolved model file
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
    model_path: PathBuf,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig, model_path: PathBuf) -> Self {
        Self { config, model_path }
    }

    pub fn parse_output(json: &str) -> Result<Vec<TranscriptSegment>> {
        let output: WhisperCppOutput = serde_json::from_str(json)
            .map_err(|e| DubError::Transcription(format!("Failed to parse whisper.cpp JSON: {}", e)))?;
        Ok(output.into())
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<TranscriptStream> {
        info!("Transcribing {} with {}", audio_path.display(), self.model_info());

        // Create temporary output directory
        let temp_dir = tempfile::tempdir()
            .map_err(|e| DubError::Transcription(format!("Failed to create temp directory: {}", e)))?;
        let output_base = temp_dir.path().join("transcript");

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-m").arg(&self.model_path)
            .arg("-f").arg(audio_path)
            .arg("-l").arg(language)
            .arg("-bs").arg(self.config.beam_size.to_string())
            .arg("-oj")
            .arg("-of").arg(&output_base)
            .arg("-np")
            .kill_on_drop(true);

        if self.config.threads > 0 {
            cmd.arg("-t").arg(self.config.threads.to_string());
        }

        debug!("Executing whisper.cpp command: {:?}", cmd);

        let output = cmd.output().await
            .map_err(|e| DubError::Transcription(format!("Failed to execute whisper.cpp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Transcription(format!("whisper.cpp failed: {}", stderr.trim())));
        }

        let json_file = output_base.with_extension("json");
        let json_content = tokio::fs::read_to_string(&json_file).await
            .map_err(|e| DubError::Transcription(format!("Failed to read output: {}", e)))?;

        let segments = Self::parse_output(&json_content)?;
        info!("Transcription produced {} segments", segments.len());
        Ok(TranscriptStream::new(segments))
    }

    fn model_info(&self) -> String {
        format!("whisper.cpp ({})", self.model_path.display())
    }
}

/// Resolves (downloading if needed) the configured ggml model
pub struct WhisperCppLoader {
    config: TranscriberConfig,
    models: ModelManager,
}

impl WhisperCppLoader {
    pub fn new(config: TranscriberConfig, models: ModelManager) -> Self {
        Self { config, models }
    }
}

#[async_trait]
impl TranscriberLoader for WhisperCppLoader {
    async fn load(&self) -> Result<Arc<dyn Transcriber>> {
        info!("Loading whisper model ({})...", self.config.model);
        let model_path = self.models.ensure_model(&self.config.model).await?;
        info!("Whisper model ready: {}", model_path.display());

        Ok(Arc::new(WhisperCppTranscriber::new(self.config.clone(), model_path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "systeminfo": "AVX = 1",
        "result": {"language": "en"},
        "transcription": [
            {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
             "offsets": {"from": 0, "to": 2500}, "text": " [Music] Hello world."},
            {"timestamps": {"from": "00:00:02,500", "to": "00:00:04,000"},
             "offsets": {"from": 2500, "to": 4000}, "text": " Second line "}
        ]
    }"#;

    #[test]
    fn test_parse_whisper_cpp_output() {
        let segments = WhisperCppTranscriber::parse_output(SAMPLE).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], TranscriptSegment::new(0.0, 2.5, "[Music] Hello world."));
        assert_eq!(segments[1].start, 2.5);
        assert_eq!(segments[1].end, 4.0);
        assert_eq!(segments[1].raw_text, "Second line");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = WhisperCppTranscriber::parse_output("{\"transcription\": 3}").unwrap_err();
        assert!(matches!(err, DubError::Transcription(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_transcription_error() {
        let mut config = crate::config::Config::default().transcriber;
        config.binary_path = "/nonexistent/whisper-cli".to_string();
        let transcriber = WhisperCppTranscriber::new(config, PathBuf::from("ggml-tiny.bin"));

        let err = transcriber.transcribe(Path::new("audio.wav"), "en").await.unwrap_err();
        assert!(matches!(err, DubError::Transcription(_)));
    }
}
