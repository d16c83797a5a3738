// Transcription architecture
//
// A `TranscriberLoader` performs the expensive model preparation once and
// hands out a shared `Transcriber`. Each `transcribe` call runs inference
// afresh and yields a forward-only `TranscriptStream`.
//
// To add a new transcription service:
// 1. Create service-specific data structures for parsing its output
// 2. Map them onto `TranscriptSegment`
// 3. Add the service to TranscriberImplementation
// 4. Update the factory to create your loader

pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use whisper_cpp::{WhisperCppLoader, WhisperCppTranscriber};
use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::segment::TranscriptSegment;
use crate::setup::ModelManager;

/// Finite, forward-only sequence of segments in time order.
///
/// Not `Clone`: re-reading a transcript means running inference again.
#[derive(Debug)]
pub struct TranscriptStream {
    segments: std::vec::IntoIter<TranscriptSegment>,
}

impl TranscriptStream {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments: segments.into_iter() }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for TranscriptStream {
    type Item = TranscriptSegment;

    fn next(&mut self) -> Option<Self::Item> {
        self.segments.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.segments.size_hint()
    }
}

/// Main trait for transcription operations
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file, `language` being a hint such as "en"
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<TranscriptStream>;

    /// Human-readable model description for logs
    fn model_info(&self) -> String;
}

/// Prepares a transcription engine. Called once per batch.
#[async_trait]
pub trait TranscriberLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Transcriber>>;
}

/// Transcriber implementation type
#[derive(Debug, Clone)]
pub enum TranscriberImplementation {
    WhisperCpp,
}

/// Factory for creating transcriber loaders
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create a loader based on implementation type
    pub fn create_loader(
        implementation: TranscriberImplementation,
        config: TranscriberConfig,
        models: ModelManager,
    ) -> Box<dyn TranscriberLoader> {
        match implementation {
            TranscriberImplementation::WhisperCpp => {
                Box::new(WhisperCppLoader::new(config, models))
            }
        }
    }

    /// Create with default implementation
    pub fn create_default(config: TranscriberConfig, models: ModelManager) -> Box<dyn TranscriberLoader> {
        Self::create_loader(TranscriberImplementation::WhisperCpp, config, models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_is_forward_only() {
        let mut stream = TranscriptStream::new(vec![
            TranscriptSegment::new(0.0, 1.0, "one"),
            TranscriptSegment::new(1.0, 2.0, "two"),
        ]);

        assert_eq!(stream.size_hint(), (2, Some(2)));
        assert_eq!(stream.next().unwrap().raw_text, "one");
        assert_eq!(stream.next().unwrap().raw_text, "two");
        assert!(stream.next().is_none());
        assert!(TranscriptStream::empty().next().is_none());
    }
}
