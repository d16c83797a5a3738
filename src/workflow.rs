use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::acquire::{AcquirerFactory, AcquiredMedia, MediaAcquirer};
use crate::classify::{classify, VoicePair};
use crate::config::Config;
use crate::error::{Result, DubError};
use crate::media::{ClipCodec, MediaProcessorFactory, MediaProcessorTrait};
use crate::segment::DubSegment;
use crate::setup::ModelManager;
use crate::synthesis::{SpeechSynthesizer, SynthesizerFactory};
use crate::text::{clean_artifacts, sanitize_filename};
use crate::timeline::{CompositeTrack, SynthesisScheduler};
use crate::transcribe::{Transcriber, TranscriberFactory, TranscriberLoader, TranscriptStream};
use crate::translate::{Translator, TranslatorFactory};

/// Cleaned source text shorter than this is not worth translating
const MIN_SEGMENT_CHARS: usize = 2;

/// Used when a title sanitizes down to nothing
const FALLBACK_TITLE: &str = "video";

/// Lifecycle of one dubbing job.
///
/// A failure in `DirectorySetup`, `Download`, `Transcribe` or `Mux` ends the
/// job in `Failed`. Translation and synthesis failures only cost the affected
/// segments, so those stages degrade to a partial or silent track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Init,
    DirectorySetup,
    Download,
    Transcribe,
    TranslateClassify,
    SynthesizeCompose,
    Mux,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Init => "init",
            JobStage::DirectorySetup => "directory setup",
            JobStage::Download => "download",
            JobStage::Transcribe => "transcribe",
            JobStage::TranslateClassify => "translate+classify",
            JobStage::SynthesizeCompose => "synthesize+compose",
            JobStage::Mux => "mux",
            JobStage::Cleanup => "cleanup",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one job in a batch
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub url: String,
    pub title: Option<String>,
    /// `Done` on success, otherwise the stage that failed
    pub stage: JobStage,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn elapsed_secs(&self) -> u64 {
        (self.finished_at - self.started_at).num_seconds().max(0) as u64
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

struct Job {
    id: Uuid,
    url: String,
    title: Option<String>,
    stage: JobStage,
    started_at: DateTime<Utc>,
}

impl Job {
    fn new(url: &str) -> Self {
        let job = Self {
            id: Uuid::new_v4(),
            url: url.to_string(),
            title: None,
            stage: JobStage::Init,
            started_at: Utc::now(),
        };
        info!("[{}] New job for {}", job.id, job.url);
        job
    }

    fn advance(&mut self, stage: JobStage) {
        info!(
            "[{}] {} -> {} ({})",
            self.id,
            self.stage,
            stage,
            self.title.as_deref().unwrap_or(&self.url)
        );
        self.stage = stage;
    }
}

/// External services a pipeline drives
pub struct Collaborators {
    pub acquirer: Box<dyn MediaAcquirer>,
    pub loader: Box<dyn TranscriberLoader>,
    pub translator: Box<dyn Translator>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub codec: Box<dyn ClipCodec>,
    pub media: Box<dyn MediaProcessorTrait>,
}

/// Runs dubbing jobs one after another, sharing one transcription engine.
pub struct Pipeline {
    config: Config,
    voices: VoicePair,
    acquirer: Box<dyn MediaAcquirer>,
    loader: Box<dyn TranscriberLoader>,
    translator: Box<dyn Translator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    codec: Box<dyn ClipCodec>,
    media: Box<dyn MediaProcessorTrait>,
}

impl Pipeline {
    pub fn new(config: Config, models: ModelManager) -> Result<Self> {
        let collaborators = Collaborators {
            acquirer: AcquirerFactory::create_default(config.acquire.clone()),
            loader: TranscriberFactory::create_default(config.transcriber.clone(), models),
            translator: TranslatorFactory::create_translator(config.translate.clone())?,
            synthesizer: SynthesizerFactory::create_default(config.synthesis.clone()),
            codec: MediaProcessorFactory::create_codec(config.media.clone()),
            media: MediaProcessorFactory::create_processor(config.media.clone()),
        };
        Ok(Self::with_collaborators(config, collaborators))
    }

    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        let voices = VoicePair::new(
            config.synthesis.farsi_voice.clone(),
            config.synthesis.english_voice.clone(),
        );

        Self {
            config,
            voices,
            acquirer: collaborators.acquirer,
            loader: collaborators.loader,
            translator: collaborators.translator,
            synthesizer: collaborators.synthesizer,
            codec: collaborators.codec,
            media: collaborators.media,
        }
    }

    /// The remux tool is a hard requirement for every job.
    pub fn check_media_tools(&self) -> Result<()> {
        self.media.check_availability()
    }

    pub async fn check_translator(&self) -> Result<()> {
        self.translator.check_availability().await
    }

    /// Process `urls` sequentially. The transcription model is loaded once
    /// up front; a failed job is recorded and the batch moves on.
    pub async fn process_batch(&self, urls: &[String]) -> Result<BatchReport> {
        info!("Starting batch of {} job(s)", urls.len());
        let transcriber = self.loader.load().await?;
        info!("Transcriber ready: {}", transcriber.model_info());

        let mut report = BatchReport::default();
        for (index, url) in urls.iter().enumerate() {
            info!("Job {}/{}: {}", index + 1, urls.len(), url);
            let outcome = self.run_job(url, &transcriber).await;
            match &outcome.output {
                Some(path) => info!("Job {}/{} finished: {}", index + 1, urls.len(), path.display()),
                None => warn!(
                    "Job {}/{} failed during {}: {}",
                    index + 1,
                    urls.len(),
                    outcome.stage,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ),
            }
            report.outcomes.push(outcome);
        }

        info!(
            "Batch complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Single-URL convenience over `process_batch`
    pub async fn process_single(&self, url: &str) -> Result<JobOutcome> {
        let mut report = self.process_batch(&[url.to_string()]).await?;
        report
            .outcomes
            .pop()
            .ok_or_else(|| DubError::Config("Batch produced no outcome".to_string()))
    }

    async fn run_job(&self, url: &str, transcriber: &Arc<dyn Transcriber>) -> JobOutcome {
        let mut job = Job::new(url);

        let result = match self.config.output.job_timeout_secs {
            Some(secs) => {
                let limit = Duration::from_secs(secs);
                // Dropping the job future kills child processes and removes the work dir
                tokio::time::timeout(limit, self.process_job(&mut job, transcriber.as_ref()))
                    .await
                    .unwrap_or_else(|_| Err(DubError::Timeout(format!("job exceeded {:?}", limit))))
            }
            None => self.process_job(&mut job, transcriber.as_ref()).await,
        };

        match result {
            Ok(output) => JobOutcome {
                url: job.url,
                title: job.title,
                stage: JobStage::Done,
                output: Some(output),
                error: None,
                started_at: job.started_at,
                finished_at: Utc::now(),
            },
            Err(e) => {
                error!("[{}] Failed during {}: {}", job.id, job.stage, e);
                let stage = job.stage;
                job.advance(JobStage::Failed);
                JobOutcome {
                    url: job.url,
                    title: job.title,
                    stage,
                    output: None,
                    error: Some(e.to_string()),
                    started_at: job.started_at,
                    finished_at: Utc::now(),
                }
            }
        }
    }

    async fn process_job(&self, job: &mut Job, transcriber: &dyn Transcriber) -> Result<PathBuf> {
        job.advance(JobStage::DirectorySetup);
        let output_dir = self.config.output.directory.clone();
        fs::create_dir_all(&output_dir).await?;
        // Same filesystem as the final file, so finalizing is a rename
        let work_dir = tempfile::Builder::new()
            .prefix(".farsi-dub-")
            .tempdir_in(&output_dir)?;
        debug!("[{}] Work directory: {}", job.id, work_dir.path().display());

        job.advance(JobStage::Download);
        let media = self.acquirer.acquire(&job.url, work_dir.path()).await?;
        job.title = Some(media.title.clone());
        let total_ms = self.track_duration_ms(&media).await?;

        job.advance(JobStage::Transcribe);
        let stream = self.transcribe(&media.video_path, work_dir.path(), transcriber).await?;

        job.advance(JobStage::TranslateClassify);
        let segments = self.translate_segments(stream).await;

        job.advance(JobStage::SynthesizeCompose);
        let mut track = CompositeTrack::new(total_ms, self.config.timeline.sample_rate);
        SynthesisScheduler::new(
            self.synthesizer.as_ref(),
            self.codec.as_ref(),
            self.config.timeline.max_speedup,
        )
        .with_synthesis_timeout(Duration::from_secs(self.config.synthesis.timeout_secs))
        .run(&segments, &mut track)
        .await;

        let dub_audio = work_dir.path().join("dub.wav");
        track.export_to(&dub_audio).await?;

        job.advance(JobStage::Mux);
        let stem = unique_stem(&output_dir, &self.output_stem(&media.title));
        let staged = work_dir.path().join(format!("{}.mp4", stem));
        self.media.remux(&media.video_path, &dub_audio, &staged).await?;

        let final_path = output_dir.join(format!("{}.mp4", stem));
        fs::rename(&staged, &final_path).await?;

        if self.config.output.write_transcript {
            let transcript_path = output_dir.join(format!("{}.txt", stem));
            if let Err(e) = write_transcript(&segments, &transcript_path).await {
                warn!("[{}] Could not write transcript: {}", job.id, e);
            }
        }

        job.advance(JobStage::Cleanup);
        if let Err(e) = work_dir.close() {
            warn!("[{}] Work directory cleanup incomplete: {}", job.id, e);
        }

        job.advance(JobStage::Done);
        Ok(final_path)
    }

    /// Probed length of the source, or the configured fallback when probing
    /// fails. Sources longer than `timeline.max_duration_ms` are refused.
    async fn track_duration_ms(&self, media: &AcquiredMedia) -> Result<u64> {
        let total_ms = match self.media.probe_duration(&media.video_path).await {
            Ok(seconds) => (seconds * 1000.0).round() as u64,
            Err(e) => {
                let fallback = self.config.timeline.fallback_duration_ms;
                warn!("Duration probe failed ({}), using fallback of {} ms", e, fallback);
                fallback
            }
        };

        let limit = self.config.timeline.max_duration_ms;
        if total_ms > limit {
            return Err(DubError::Probe(format!(
                "source runs {} ms, longer than the {} ms timeline limit",
                total_ms, limit
            )));
        }
        Ok(total_ms)
    }

    /// A transcript that comes back empty is fine; a failed run is not.
    async fn transcribe(&self, video_path: &Path, work_dir: &Path, transcriber: &dyn Transcriber) -> Result<TranscriptStream> {
        let audio_path = work_dir.join("source_audio.wav");
        self.media.extract_audio(video_path, &audio_path).await?;
        let stream = transcriber.transcribe(&audio_path, &self.config.transcriber.language).await?;

        if stream.size_hint().0 == 0 {
            warn!("Transcription produced no segments, the dub will be silent");
        }
        Ok(stream)
    }

    async fn translate_segments(&self, stream: TranscriptStream) -> Vec<DubSegment> {
        let source = &self.config.translate.source_language;
        let target = &self.config.translate.target_language;

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }

        let mut segments = Vec::new();
        let mut too_short = 0;
        let mut failed = 0;

        for (index, segment) in stream.enumerate() {
            let text = clean_artifacts(&segment.raw_text);
            if text.chars().count() < MIN_SEGMENT_CHARS {
                debug!("Segment {} too short after cleaning, dropped", index + 1);
                too_short += 1;
                continue;
            }

            match self.translator.translate(&text, source, target).await {
                Ok(translated) => {
                    let (final_text, voice) = classify(&translated, &text, &self.voices);
                    segments.push(DubSegment::new(segment.start, segment.end, final_text, voice));
                }
                Err(e) if e.is_segment_local() => {
                    warn!("Segment {} not translated, dropped: {}", index + 1, e);
                    failed += 1;
                }
                Err(e) => {
                    error!("Segment {} dropped after unexpected error: {}", index + 1, e);
                    failed += 1;
                }
            }

            spinner.set_message(format!("Translated {} segments", segments.len()));
            spinner.tick();
        }
        spinner.finish_and_clear();

        segments.sort_by(|a, b| a.start.total_cmp(&b.start));

        let english = segments.iter().filter(|s| s.voice == self.voices.english).count();
        info!(
            "Prepared {} segments ({} English-heavy), {} too short, {} failed translation",
            segments.len(),
            english,
            too_short,
            failed
        );
        segments
    }

    fn output_stem(&self, title: &str) -> String {
        let mut name = sanitize_filename(title);
        if name.is_empty() {
            name = FALLBACK_TITLE.to_string();
        }
        format!("{}{}", name, self.config.output.filename_suffix)
    }
}

/// `stem`, or `stem (N)` for the first N whose video and transcript names
/// are both free in `dir`
fn unique_stem(dir: &Path, stem: &str) -> String {
    let taken = |candidate: &str| {
        dir.join(format!("{}.mp4", candidate)).exists() || dir.join(format!("{}.txt", candidate)).exists()
    };

    if !taken(stem) {
        return stem.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", stem, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// One final segment text per line
async fn write_transcript(segments: &[DubSegment], path: &Path) -> Result<()> {
    let mut content = String::new();
    for segment in segments {
        content.push_str(&segment.text);
        content.push('\n');
    }
    fs::write(path, content).await?;
    info!("Transcript written to {}", path.display());
    Ok(())
}
