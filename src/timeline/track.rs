use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::audio::{encode_wav, ms_to_samples, samples_to_ms};
use crate::error::Result;

/// Fixed-length mono mix buffer covering the whole source timeline.
///
/// Clips are summed in place; the buffer never grows, so anything past the
/// declared end is dropped.
#[derive(Debug)]
pub struct CompositeTrack {
    samples: Vec<f32>,
    sample_rate: u32,
    total_ms: u64,
    clips: usize,
}

impl CompositeTrack {
    /// Silent track of exactly `total_ms`.
    pub fn new(total_ms: u64, sample_rate: u32) -> Self {
        let len = ms_to_samples(total_ms, sample_rate);
        debug!("Allocating composite track: {} ms, {} samples @ {} Hz", total_ms, len, sample_rate);
        Self {
            samples: vec![0.0; len],
            sample_rate,
            total_ms,
            clips: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Duration represented by the buffer, which always equals `total_ms`
    /// up to sample rounding.
    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.samples.len(), self.sample_rate)
    }

    /// Number of clips mixed in so far.
    pub fn clip_count(&self) -> usize {
        self.clips
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Additively mix `clip` into the track beginning at `start_ms`.
    ///
    /// Overlapping clips sum; there is no ducking or crossfade.
    pub fn overlay(&mut self, clip: &[f32], start_ms: u64) {
        let offset = ms_to_samples(start_ms, self.sample_rate);
        self.clips += 1;

        if offset >= self.samples.len() {
            debug!("Clip at {} ms starts past the end of the track, dropped", start_ms);
            return;
        }

        let available = self.samples.len() - offset;
        if clip.len() > available {
            debug!(
                "Clip at {} ms overruns the track by {} samples, truncated",
                start_ms,
                clip.len() - available
            );
        }

        for (dst, src) in self.samples[offset..].iter_mut().zip(clip) {
            *dst += *src;
        }
    }

    /// Serialize the finished track as 16-bit mono WAV. Consumes the track.
    pub fn export(self) -> Result<Vec<u8>> {
        info!(
            "Exporting composite track: {} ms with {} clips",
            self.total_ms, self.clips
        );
        encode_wav(&self.samples, self.sample_rate)
    }

    /// Export and write to `path`.
    pub async fn export_to<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.export()?;
        fs::write(path, bytes).await?;
        info!("Composite track written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode_wav;

    const RATE: u32 = 1_000;

    #[test]
    fn test_new_track_is_silent_and_exact() {
        let track = CompositeTrack::new(10_000, RATE);
        assert_eq!(track.duration_ms(), 10_000);
        assert_eq!(track.total_ms(), 10_000);
        assert!(track.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_overlay_places_at_offset() {
        let mut track = CompositeTrack::new(1_000, RATE);
        track.overlay(&[0.25; 100], 200);

        assert_eq!(track.samples()[199], 0.0);
        assert_eq!(track.samples()[200], 0.25);
        assert_eq!(track.samples()[299], 0.25);
        assert_eq!(track.samples()[300], 0.0);
        assert_eq!(track.clip_count(), 1);
    }

    #[test]
    fn test_overlapping_clips_sum() {
        let mut track = CompositeTrack::new(1_000, RATE);
        track.overlay(&[0.25; 300], 100);
        track.overlay(&[0.5; 300], 300);

        assert_eq!(track.samples()[150], 0.25);
        assert_eq!(track.samples()[350], 0.75);
        assert_eq!(track.samples()[550], 0.5);
    }

    #[test]
    fn test_overrun_is_truncated_not_grown() {
        let mut track = CompositeTrack::new(1_000, RATE);
        track.overlay(&[0.1; 500], 800);
        track.overlay(&[0.1; 10], 5_000);

        assert_eq!(track.duration_ms(), 1_000);
        assert_eq!(track.samples()[999], 0.1);
        assert_eq!(track.clip_count(), 2);
    }

    #[test]
    fn test_export_keeps_length() {
        let mut track = CompositeTrack::new(2_000, RATE);
        track.overlay(&[0.9; 100], 0);
        track.overlay(&[0.9; 100], 0);

        let pcm = decode_wav(&track.export().unwrap()).unwrap();
        assert_eq!(pcm.duration_ms(), 2_000);
        // summed above full scale, clamped on export
        assert!((pcm.samples[0] - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_export_to_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dub.wav");

        CompositeTrack::new(500, RATE).export_to(&path).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(decode_wav(&bytes).unwrap().samples.len(), 500);
    }
}
