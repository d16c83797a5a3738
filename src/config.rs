use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, DubError};

// Default values for timeline configuration
fn default_sample_rate() -> u32 {
    24_000
}

fn default_max_speedup() -> f64 {
    1.5
}

fn default_fallback_duration_ms() -> u64 {
    600_000
}

fn default_max_duration_ms() -> u64 {
    3 * 60 * 60 * 1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub acquire: AcquireConfig,
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub synthesis: SynthesisConfig,
    pub timeline: TimelineConfig,
    pub media: MediaConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Path to yt-dlp binary
    pub binary_path: String,
    /// Format selector passed to `-f`
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to transcriber binary (e.g., whisper-cli)
    pub binary_path: String,
    /// Model name (e.g. "medium.en") or path to a ggml model file
    pub model: String,
    /// Spoken language of the source media
    pub language: String,
    /// Beam size for decoding
    pub beam_size: u32,
    /// Worker threads handed to the transcriber, 0 lets it decide
    pub threads: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TranslationBackend {
    /// Google's public translate endpoint
    Google,
    /// Local Ollama model
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Which translation service to use
    pub backend: TranslationBackend,
    /// Endpoint URL (Google endpoint or Ollama server)
    pub endpoint: String,
    /// LLM model to use when the backend is Ollama
    pub model: String,
    pub source_language: String,
    pub target_language: String,
    /// HTTP timeout per request
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Path to edge-tts binary
    pub binary_path: String,
    /// Voice used for Farsi segments
    pub farsi_voice: String,
    /// Voice used for English-heavy segments
    pub english_voice: String,
    /// Upper bound on a single synthesis call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Sample rate of the composite track
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Largest speed-up applied to a synthesized clip
    #[serde(default = "default_max_speedup")]
    pub max_speedup: f64,
    /// Track length used when the source duration cannot be probed
    #[serde(default = "default_fallback_duration_ms")]
    pub fallback_duration_ms: u64,
    /// Longest source the composite track may cover; longer jobs are refused
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_binary_path: String,
    /// Codec for the dubbed audio stream in the final file
    pub audio_codec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving final files and per-job work directories
    pub directory: PathBuf,
    /// Write a UTF-8 transcript next to the dubbed video
    pub write_transcript: bool,
    /// Appended to the sanitized title for output filenames
    pub filename_suffix: String,
    /// Upper bound on a whole job, unlimited when absent
    pub job_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquire: AcquireConfig {
                binary_path: "yt-dlp".to_string(),
                format: "bv*[ext=mp4]+ba/b".to_string(),
            },
            transcriber: TranscriberConfig {
                binary_path: "whisper-cli".to_string(),
                model: "medium.en".to_string(),
                language: "en".to_string(),
                beam_size: 5,
                threads: 0,
            },
            translate: TranslateConfig {
                backend: TranslationBackend::Google,
                endpoint: "https://translate.googleapis.com".to_string(),
                model: "llama3.2:3b".to_string(),
                source_language: "en".to_string(),
                target_language: "fa".to_string(),
                timeout_secs: 30,
            },
            synthesis: SynthesisConfig {
                binary_path: "edge-tts".to_string(),
                farsi_voice: "fa-IR-DilaraNeural".to_string(),
                english_voice: "en-US-AriaNeural".to_string(),
                timeout_secs: 60,
            },
            timeline: TimelineConfig {
                sample_rate: default_sample_rate(),
                max_speedup: default_max_speedup(),
                fallback_duration_ms: default_fallback_duration_ms(),
                max_duration_ms: default_max_duration_ms(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                probe_binary_path: "ffprobe".to_string(),
                audio_codec: "aac".to_string(),
            },
            output: OutputConfig {
                directory: PathBuf::from("Farsi_Dubbed_Output"),
                write_transcript: true,
                filename_suffix: "_FARSI_DUB".to_string(),
                job_timeout_secs: None,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DubError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| DubError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeline.sample_rate == 0 {
            return Err(DubError::Config("timeline.sample_rate must be positive".to_string()));
        }
        if self.timeline.max_speedup < 1.0 {
            return Err(DubError::Config(format!(
                "timeline.max_speedup must be at least 1.0, got {}",
                self.timeline.max_speedup
            )));
        }
        if self.timeline.fallback_duration_ms > self.timeline.max_duration_ms {
            return Err(DubError::Config(format!(
                "timeline.fallback_duration_ms ({}) exceeds timeline.max_duration_ms ({})",
                self.timeline.fallback_duration_ms, self.timeline.max_duration_ms
            )));
        }
        if self.synthesis.farsi_voice.trim().is_empty() || self.synthesis.english_voice.trim().is_empty() {
            return Err(DubError::Config("synthesis voices must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farsi-dub.toml");

        Config::default().save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();

        assert_eq!(loaded.transcriber.model, "medium.en");
        assert_eq!(loaded.synthesis.farsi_voice, "fa-IR-DilaraNeural");
        assert_eq!(loaded.timeline.max_speedup, 1.5);
        assert_eq!(loaded.timeline.fallback_duration_ms, 600_000);
        assert!(loaded.output.job_timeout_secs.is_none());
    }

    #[test]
    fn test_timeline_defaults_fill_missing_fields() {
        let mut value = toml::Value::try_from(Config::default()).unwrap();
        value["timeline"] = toml::Value::Table(toml::map::Map::new());
        let config: Config = toml::from_str(&toml::to_string(&value).unwrap()).unwrap();

        assert_eq!(config.timeline.sample_rate, 24_000);
        assert_eq!(config.timeline.max_speedup, 1.5);
    }

    #[test]
    fn test_rejects_fallback_longer_than_cap() {
        let mut config = Config::default();
        assert_eq!(config.timeline.max_duration_ms, 10_800_000);
        config.timeline.max_duration_ms = 60_000;
        assert!(matches!(config.validate(), Err(DubError::Config(_))));
    }

    #[test]
    fn test_rejects_speedup_below_one() {
        let mut config = Config::default();
        config.timeline.max_speedup = 0.8;
        assert!(matches!(config.validate(), Err(DubError::Config(_))));
    }
}
