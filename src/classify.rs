//! Per-segment voice selection for mixed Farsi/English output.
//!
//! Technical passages (math, code, product names) often come back from the
//! translator still mostly Latin. Those are spoken in the original English by
//! the English voice; everything else uses the Farsi translation.

use crate::segment::VoiceId;

/// The two voices a segment can be assigned.
#[derive(Debug, Clone)]
pub struct VoicePair {
    pub farsi: VoiceId,
    pub english: VoiceId,
}

impl VoicePair {
    pub fn new(farsi: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            farsi: VoiceId::new(farsi),
            english: VoiceId::new(english),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptCounts {
    pub english: usize,
    pub farsi: usize,
}

impl ScriptCounts {
    pub fn of(text: &str) -> Self {
        text.chars().fold(Self { english: 0, farsi: 0 }, |mut acc, c| {
            if c.is_ascii_alphanumeric() {
                acc.english += 1;
            } else if ('\u{0600}'..='\u{06FF}').contains(&c) {
                acc.farsi += 1;
            }
            acc
        })
    }

    pub fn is_english_heavy(&self) -> bool {
        self.english > self.farsi
    }
}

/// Pick the final text and voice for one segment.
///
/// Stateless: neighbouring segments have no influence, so a borderline
/// segment may switch voice relative to the one before it.
pub fn classify(translated_text: &str, original_text: &str, voices: &VoicePair) -> (String, VoiceId) {
    if ScriptCounts::of(translated_text).is_english_heavy() {
        (original_text.to_string(), voices.english.clone())
    } else {
        (translated_text.to_string(), voices.farsi.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> VoicePair {
        VoicePair::new("fa-IR-DilaraNeural", "en-US-AriaNeural")
    }

    #[test]
    fn test_counts() {
        let counts = ScriptCounts::of("سلام x2 !");
        assert_eq!(counts, ScriptCounts { english: 2, farsi: 4 });
    }

    #[test]
    fn test_farsi_translation_uses_farsi_voice() {
        let (text, voice) = classify("این یک آزمایش است", "This is a test", &voices());
        assert_eq!(text, "این یک آزمایش است");
        assert_eq!(voice.as_str(), "fa-IR-DilaraNeural");
    }

    #[test]
    fn test_english_heavy_keeps_original() {
        let (text, voice) = classify("f(x) = x^2 + 3x در Python", "f of x equals x squared in Python", &voices());
        assert_eq!(text, "f of x equals x squared in Python");
        assert_eq!(voice.as_str(), "en-US-AriaNeural");
    }

    #[test]
    fn test_tie_and_empty_go_to_farsi() {
        let (text, voice) = classify("...!?", "Hm.", &voices());
        assert_eq!(text, "...!?");
        assert_eq!(voice, voices().farsi);

        // two of each
        let (_, voice) = classify("ab سل", "ab", &voices());
        assert_eq!(voice, voices().farsi);
    }

    #[test]
    fn test_deterministic() {
        let first = classify("GPU و CPU", "GPU and CPU", &voices());
        for _ in 0..5 {
            assert_eq!(classify("GPU و CPU", "GPU and CPU", &voices()), first);
        }
    }
}
