use serde::{Deserialize, Serialize};
use std::fmt;

/// A time-stamped span of recognised speech, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub raw_text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, raw_text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            raw_text: raw_text.into(),
        }
    }
}

/// Opaque name of a synthesis voice, e.g. `fa-IR-DilaraNeural`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A segment ready for synthesis: final text and the voice that speaks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DubSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub voice: VoiceId,
}

impl DubSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>, voice: VoiceId) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            voice,
        }
    }

    /// Length of the segment's slot in whole milliseconds.
    pub fn slot_ms(&self) -> i64 {
        ((self.end - self.start) * 1000.0).round() as i64
    }

    /// Offset of the slot on the source timeline in milliseconds.
    pub fn start_ms(&self) -> u64 {
        (self.start.max(0.0) * 1000.0).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ms_rounds() {
        let voice = VoiceId::new("fa-IR-DilaraNeural");
        assert_eq!(DubSegment::new(1.0, 3.0, "x", voice.clone()).slot_ms(), 2000);
        assert_eq!(DubSegment::new(0.1, 0.1004, "x", voice.clone()).slot_ms(), 0);
        assert_eq!(DubSegment::new(5.0, 5.0, "x", voice.clone()).slot_ms(), 0);
        assert_eq!(DubSegment::new(6.0, 5.0, "x", voice).slot_ms(), -1000);
    }

    #[test]
    fn test_start_ms() {
        let seg = DubSegment::new(6.25, 9.0, "c", VoiceId::new("v"));
        assert_eq!(seg.start_ms(), 6250);
    }
}
