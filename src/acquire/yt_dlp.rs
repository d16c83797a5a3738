use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::AcquireConfig;
use crate::error::{Result, DubError};
use crate::media::MediaCommand;
use super::{AcquiredMedia, MediaAcquirer};

/// Stem of the downloaded file inside the work directory
const SOURCE_STEM: &str = "source";

/// Subset of `yt-dlp --dump-single-json`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub duration: Option<f64>,
}

/// yt-dlp command line downloader
pub struct YtDlpAcquirer {
    config: AcquireConfig,
}

impl YtDlpAcquirer {
    pub fn new(config: AcquireConfig) -> Self {
        Self { config }
    }

    pub fn parse_metadata(json: &[u8]) -> Result<VideoMetadata> {
        serde_json::from_slice(json)
            .map_err(|e| DubError::Acquisition(format!("Failed to parse video metadata: {}", e)))
    }

    fn command(&self, description: &str) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, description)
            .on_failure(DubError::Acquisition)
            .arg("--no-playlist")
    }

    /// Locate the merged download; yt-dlp picks the extension itself.
    fn find_download(work_dir: &Path) -> Result<PathBuf> {
        for entry in std::fs::read_dir(work_dir)? {
            let path = entry?.path();
            let is_source = path.file_stem().and_then(|s| s.to_str()) == Some(SOURCE_STEM);
            let is_partial = path.extension().and_then(|s| s.to_str()) == Some("part");
            if path.is_file() && is_source && !is_partial {
                return Ok(path);
            }
        }
        Err(DubError::Acquisition(format!(
            "Download finished but no media file was found in {}",
            work_dir.display()
        )))
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    async fn acquire(&self, source: &str, work_dir: &Path) -> Result<AcquiredMedia> {
        info!("Fetching metadata for {}", source);

        let stdout = self.command("Read video metadata")
            .arg("--dump-single-json")
            .arg(source)
            .execute()
            .await?;
        let metadata = Self::parse_metadata(&stdout)?;
        let title = metadata
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "video".to_string());

        info!("Downloading \"{}\"", title);

        let template = work_dir.join(format!("{}.%(ext)s", SOURCE_STEM));
        self.command("Download video")
            .arg("-f")
            .arg(&self.config.format)
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("-o")
            .output(&template)
            .arg(source)
            .execute()
            .await?;

        let video_path = Self::find_download(work_dir)?;
        debug!("Downloaded to {}", video_path.display());

        Ok(AcquiredMedia {
            video_path,
            title,
            duration_secs: metadata.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_parse_metadata() {
        let json = br#"{"id": "abc", "title": "Linear Algebra: Lecture 1", "duration": 3125.0, "formats": []}"#;
        let metadata = YtDlpAcquirer::parse_metadata(json).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Linear Algebra: Lecture 1"));
        assert_eq!(metadata.duration, Some(3125.0));

        let sparse = YtDlpAcquirer::parse_metadata(b"{\"id\": \"abc\"}").unwrap();
        assert!(sparse.title.is_none());
        assert!(sparse.duration.is_none());

        assert!(matches!(
            YtDlpAcquirer::parse_metadata(b"ERROR: unsupported URL"),
            Err(DubError::Acquisition(_))
        ));
    }

    #[test]
    fn test_find_download_skips_partial_files() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("source.mp4.part").touch().unwrap();
        assert!(YtDlpAcquirer::find_download(dir.path()).is_err());

        dir.child("source.mp4").touch().unwrap();
        dir.child("audio.wav").touch().unwrap();
        assert_eq!(
            YtDlpAcquirer::find_download(dir.path()).unwrap(),
            dir.child("source.mp4").path()
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_acquisition_error() {
        let acquirer = YtDlpAcquirer::new(AcquireConfig {
            binary_path: "/nonexistent/yt-dlp".to_string(),
            format: "b".to_string(),
        });
        let dir = tempfile::tempdir().unwrap();

        let err = acquirer.acquire("https://example.com/v", dir.path()).await.unwrap_err();
        assert!(matches!(err, DubError::Acquisition(_)));
    }
}
