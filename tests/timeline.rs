use async_trait::async_trait;
use std::sync::Mutex;

use farsi_dub::audio::{decode_wav, ms_to_samples, Pcm};
use farsi_dub::error::{DubError, Result};
use farsi_dub::media::ClipCodec;
use farsi_dub::segment::{DubSegment, VoiceId};
use farsi_dub::synthesis::SpeechSynthesizer;
use farsi_dub::timeline::{CompositeTrack, SynthesisScheduler};

const RATE: u32 = 1_000;

/// Clip length per text: "a" 1500 ms, "b" 2500 ms, "c" 4000 ms.
struct ScriptedSynth {
    failing: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSynth {
    fn new(failing: Option<&'static str>) -> Self {
        Self { failing, calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynth {
    async fn synthesize(&self, text: &str, _voice: &VoiceId) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.failing == Some(text) {
            return Err(DubError::Synthesis("503 from speech service".into()));
        }
        let ms: u64 = match text {
            "a" => 1500,
            "b" => 2500,
            _ => 4000,
        };
        Ok(ms.to_le_bytes().to_vec())
    }
}

/// Each text gets its own amplitude so placements can be told apart.
struct LevelCodec;

#[async_trait]
impl ClipCodec for LevelCodec {
    async fn decode(&self, bytes: &[u8], sample_rate: u32) -> Result<Pcm> {
        let raw: [u8; 8] = bytes.try_into().map_err(|_| DubError::Media("bad clip".into()))?;
        let ms = u64::from_le_bytes(raw);
        let level = match ms {
            1500 => 0.1,
            2500 => 0.2,
            _ => 0.4,
        };
        Ok(Pcm::new(vec![level; ms_to_samples(ms, sample_rate)], sample_rate))
    }

    async fn speed_up(&self, clip: &Pcm, factor: f64) -> Result<Pcm> {
        let len = (clip.samples.len() as f64 / factor).round() as usize;
        let level = clip.samples.first().copied().unwrap_or(0.0);
        Ok(Pcm::new(vec![level; len], clip.sample_rate))
    }
}

fn segments() -> Vec<DubSegment> {
    let voice = VoiceId::new("fa-IR-DilaraNeural");
    vec![
        DubSegment::new(0.0, 2.0, "a", voice.clone()),
        DubSegment::new(5.0, 7.0, "b", voice.clone()),
        DubSegment::new(6.0, 9.0, "c", voice),
    ]
}

#[test]
fn overlapping_segments_keep_track_length() {
    let synth = ScriptedSynth::new(None);
    let mut track = CompositeTrack::new(10_000, RATE);

    let report = tokio_test::block_on(
        SynthesisScheduler::new(&synth, &LevelCodec, 1.5).run(&segments(), &mut track),
    );

    assert_eq!(report.placed.len(), 3);
    // "b" fits as-is, "c" runs 4000 ms in a 3000 ms slot
    assert_eq!(report.placed[1].factor, None);
    assert_eq!(report.placed[2].factor, Some(4.0 / 3.0));
    assert_eq!(track.duration_ms(), 10_000);

    // "b" (5000..7500) and "c" (6000..9000) overlap and sum
    let samples = track.samples();
    assert!((samples[5500] - 0.2).abs() < 1e-6);
    assert!((samples[6500] - 0.6).abs() < 1e-6);
    assert!((samples[8000] - 0.4).abs() < 1e-6);

    let exported = decode_wav(&track.export().unwrap()).unwrap();
    assert_eq!(exported.duration_ms(), 10_000);
}

#[test]
fn failed_segment_leaves_neighbours_in_place() {
    let synth = ScriptedSynth::new(Some("b"));
    let mut track = CompositeTrack::new(10_000, RATE);

    let report = tokio_test::block_on(
        SynthesisScheduler::new(&synth, &LevelCodec, 1.5).run(&segments(), &mut track),
    );

    assert_eq!(*synth.calls.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(report.failed, 1);
    let starts: Vec<u64> = report.placed.iter().map(|p| p.start_ms).collect();
    assert_eq!(starts, vec![0, 6000]);

    let samples = track.samples();
    assert!((samples[1000] - 0.1).abs() < 1e-6);
    assert_eq!(samples[5500], 0.0);
    assert!((samples[6500] - 0.4).abs() < 1e-6);
    assert_eq!(track.duration_ms(), 10_000);
}
