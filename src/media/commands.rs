use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, DubError};

/// Media tool invocation with a checked exit status.
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    failure: fn(String) -> DubError,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            failure: DubError::Media,
        }
    }

    /// Error kind produced when the command cannot run or exits non-zero
    pub fn on_failure(mut self, failure: fn(String) -> DubError) -> Self {
        self.failure = failure;
        self
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Only report errors on stderr
    pub fn quiet(self) -> Self {
        self.arg("-v").arg("error")
    }

    /// Map an input stream into the output
    pub fn map<S: Into<String>>(self, spec: S) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add audio filter
    pub fn audio_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-af").arg(filter)
    }

    /// Stop at the end of the shortest input stream
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    /// Execute the command and return its stdout
    pub async fn execute(&self) -> Result<Vec<u8>> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args).kill_on_drop(true);

        let output = cmd.output().await
            .map_err(|e| (self.failure)(format!(
                "Failed to execute {}: {}", self.binary_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err((self.failure)(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// `atempo` filter chain for a speed-up factor. A single `atempo` stage
/// accepts at most 2.0, so larger factors are split into several stages.
pub fn atempo_chain(factor: f64) -> String {
    let mut remaining = factor.max(0.5);
    let mut stages = Vec::new();
    while remaining > 2.0 {
        stages.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    stages.push(format!("atempo={:.6}", remaining));
    stages.join(",")
}

/// Builder for the media operations the dubbing pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_binary_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_binary_path: probe_binary_path.into(),
        }
    }

    /// Build audio extraction command (16 kHz mono PCM for the transcriber)
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .quiet()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }

    /// Build clip decoding command (any input to mono PCM WAV at `sample_rate`)
    pub fn decode_clip<P: AsRef<Path>>(
        &self,
        clip_path: P,
        wav_path: P,
        sample_rate: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Clip decoding")
            .quiet()
            .input(clip_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(sample_rate)
            .audio_channels(1)
            .overwrite()
            .output(wav_path)
    }

    /// Build time-compression command, pitch preserved by `atempo`
    pub fn speed_up<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        factor: f64,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, format!("Speed-up x{:.3}", factor))
            .quiet()
            .input(input_path)
            .audio_filter(atempo_chain(factor))
            .audio_codec("pcm_s16le")
            .overwrite()
            .output(output_path)
    }

    /// Build remux command: keep the video stream bit-identical, replace audio
    pub fn remux<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        output_path: P,
        audio_codec: &str,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Remux")
            .on_failure(DubError::Mux)
            .quiet()
            .input(video_path)
            .input(audio_path)
            .map("0:v:0")
            .map("1:a:0")
            .copy_video()
            .audio_codec(audio_codec)
            .shortest()
            .overwrite()
            .output(output_path)
    }

    /// Build duration probe command (prints seconds on stdout)
    pub fn probe_duration<P: AsRef<Path>>(&self, media_path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, "Duration probe")
            .on_failure(DubError::Probe)
            .quiet()
            .args(["-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .output(media_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe")
    }

    #[test]
    fn test_atempo_chain() {
        assert_eq!(atempo_chain(1.5), "atempo=1.500000");
        assert_eq!(atempo_chain(5.0), "atempo=2.0,atempo=2.0,atempo=1.250000");
    }

    #[test]
    fn test_remux_copies_video_and_maps_streams() {
        let cmd = builder().remux("in.mp4", "dub.wav", "out.mp4", "aac");
        let args = cmd.args.join(" ");

        assert!(args.contains("-i in.mp4 -i dub.wav"));
        assert!(args.contains("-map 0:v:0 -map 1:a:0"));
        assert!(args.contains("-c:v copy"));
        assert!(args.contains("-c:a aac"));
        assert!(args.contains("-shortest"));
        assert!(args.ends_with("out.mp4"));
    }

    #[test]
    fn test_probe_uses_probe_binary() {
        let cmd = builder().probe_duration("in.mp4");
        assert_eq!(cmd.binary_path, "ffprobe");
        assert!(cmd.args.contains(&"format=duration".to_string()));
    }

    #[tokio::test]
    async fn test_failure_kind_is_mapped() {
        let cmd = MediaCommand::new("/nonexistent/ffmpeg-binary", "Remux").on_failure(DubError::Mux);
        assert!(matches!(cmd.execute().await, Err(DubError::Mux(_))));

        let cmd = MediaCommand::new("/nonexistent/ffprobe-binary", "Probe").on_failure(DubError::Probe);
        assert!(matches!(cmd.execute().await, Err(DubError::Probe(_))));
    }
}
