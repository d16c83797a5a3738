use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{Result, DubError};
use crate::media::ClipCodec;
use crate::segment::DubSegment;
use crate::synthesis::SpeechSynthesizer;
use super::CompositeTrack;

/// Speed-up needed to fit `natural_ms` of speech into `slot_ms`, or `None`
/// when the clip already fits. Capped at `max_speedup`.
pub fn speed_factor(natural_ms: u64, slot_ms: u64, max_speedup: f64) -> Option<f64> {
    if slot_ms == 0 || natural_ms <= slot_ms {
        return None;
    }
    let raw = natural_ms as f64 / slot_ms as f64;
    Some(raw.min(max_speedup))
}

/// A clip that made it onto the track.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedClip {
    pub index: usize,
    pub start_ms: u64,
    pub slot_ms: u64,
    pub natural_ms: u64,
    pub placed_ms: u64,
    pub factor: Option<f64>,
}

impl PlacedClip {
    /// Milliseconds the clip runs past the end of its slot.
    pub fn overflow_ms(&self) -> u64 {
        self.placed_ms.saturating_sub(self.slot_ms)
    }
}

#[derive(Debug, Default)]
pub struct ScheduleReport {
    pub placed: Vec<PlacedClip>,
    /// Segments with an empty or negative slot
    pub skipped: usize,
    /// Segments whose synthesis or processing failed
    pub failed: usize,
}

impl ScheduleReport {
    pub fn scaled(&self) -> usize {
        self.placed.iter().filter(|clip| clip.factor.is_some()).count()
    }
}

/// Synthesizes each segment, fits it to its slot, and mixes it into the
/// composite track in timeline order.
pub struct SynthesisScheduler<'a> {
    synthesizer: &'a dyn SpeechSynthesizer,
    codec: &'a dyn ClipCodec,
    max_speedup: f64,
    synthesis_timeout: Option<Duration>,
}

impl<'a> SynthesisScheduler<'a> {
    pub fn new(synthesizer: &'a dyn SpeechSynthesizer, codec: &'a dyn ClipCodec, max_speedup: f64) -> Self {
        Self {
            synthesizer,
            codec,
            max_speedup,
            synthesis_timeout: None,
        }
    }

    pub fn with_synthesis_timeout(mut self, timeout: Duration) -> Self {
        self.synthesis_timeout = Some(timeout);
        self
    }

    /// Process every segment once, in order. Never fails: a bad segment is
    /// logged and contributes nothing to the track.
    pub async fn run(&self, segments: &[DubSegment], track: &mut CompositeTrack) -> ScheduleReport {
        let mut report = ScheduleReport::default();
        let total = segments.len();

        for (index, segment) in segments.iter().enumerate() {
            let slot_ms = segment.slot_ms();
            if slot_ms <= 0 {
                debug!("Segment {}/{} has no slot ({} ms), skipped", index + 1, total, slot_ms);
                report.skipped += 1;
                continue;
            }

            match self.render(segment, slot_ms as u64, track.sample_rate()).await {
                Ok((samples, mut placed)) => {
                    placed.index = index;
                    track.overlay(&samples, placed.start_ms);
                    if placed.overflow_ms() > 0 {
                        debug!(
                            "Segment {}/{} overflows its slot by {} ms",
                            index + 1, total, placed.overflow_ms()
                        );
                    }
                    info!(
                        "Segment {}/{} placed at {} ms ({} voice, {} ms{})",
                        index + 1,
                        total,
                        placed.start_ms,
                        segment.voice,
                        placed.placed_ms,
                        placed.factor.map(|f| format!(", x{:.2}", f)).unwrap_or_default()
                    );
                    report.placed.push(placed);
                }
                Err(e) if e.is_segment_local() => {
                    warn!("Segment {}/{} skipped: {}", index + 1, total, e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("Segment {}/{} skipped after unexpected error: {}", index + 1, total, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Scheduled {} segments: {} placed ({} time-compressed), {} skipped, {} failed",
            total,
            report.placed.len(),
            report.scaled(),
            report.skipped,
            report.failed
        );
        report
    }

    async fn render(&self, segment: &DubSegment, slot_ms: u64, sample_rate: u32) -> Result<(Vec<f32>, PlacedClip)> {
        let bytes = self.synthesize(segment).await?;
        let clip = self.codec.decode(&bytes, sample_rate).await?;
        drop(bytes);

        if clip.sample_rate != sample_rate {
            return Err(DubError::Media(format!(
                "Clip decoded at {} Hz, track expects {} Hz",
                clip.sample_rate, sample_rate
            )));
        }

        let natural_ms = clip.duration_ms();
        let factor = speed_factor(natural_ms, slot_ms, self.max_speedup);
        let clip = match factor {
            Some(factor) => self.codec.speed_up(&clip, factor).await?,
            None => clip,
        };

        let placed = PlacedClip {
            index: 0,
            start_ms: segment.start_ms(),
            slot_ms,
            natural_ms,
            placed_ms: clip.duration_ms(),
            factor,
        };
        Ok((clip.samples, placed))
    }

    async fn synthesize(&self, segment: &DubSegment) -> Result<Vec<u8>> {
        let call = self.synthesizer.synthesize(&segment.text, &segment.voice);
        match self.synthesis_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| DubError::Timeout(format!("synthesis exceeded {:?}", limit)))?,
            None => call.await,
        }
    }
}
