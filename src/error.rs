use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Media acquisition error: {0}")]
    Acquisition(String),

    #[error("Duration probe error: {0}")]
    Probe(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Remux error: {0}")]
    Mux(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl DubError {
    /// Errors expected while rendering a single segment. Anything else
    /// surfacing at a segment boundary is still contained there, but is
    /// logged as unexpected.
    pub fn is_segment_local(&self) -> bool {
        matches!(
            self,
            DubError::Translation(_)
                | DubError::Synthesis(_)
                | DubError::Timeout(_)
                | DubError::Wav(_)
                | DubError::Media(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_local_classification() {
        assert!(DubError::Synthesis("edge-tts exited 1".into()).is_segment_local());
        assert!(DubError::Translation("429".into()).is_segment_local());
        assert!(!DubError::Mux("no output".into()).is_segment_local());
        assert!(!DubError::Config("bad".into()).is_segment_local());
    }
}
