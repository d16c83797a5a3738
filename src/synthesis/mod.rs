// Speech synthesis collaborators
//
// The scheduler only needs bytes for a (text, voice) pair; decoding and
// timing happen downstream in the clip codec.

pub mod edge_tts;

use async_trait::async_trait;

pub use edge_tts::EdgeTtsSynthesizer;
use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::segment::VoiceId;

/// Turns text into encoded speech audio (any container ffmpeg can read).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &VoiceId) -> Result<Vec<u8>>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    pub fn create_default(config: SynthesisConfig) -> Box<dyn SpeechSynthesizer> {
        Box::new(EdgeTtsSynthesizer::new(config))
    }
}
