// Media acquisition
//
// Resolves a source reference (a video URL) into a local media file plus the
// metadata the rest of the job needs: the title for naming outputs and, when
// the site reports it, the duration.

pub mod yt_dlp;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use yt_dlp::YtDlpAcquirer;
use crate::config::AcquireConfig;
use crate::error::Result;

/// A downloaded source video
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredMedia {
    pub video_path: PathBuf,
    pub title: String,
    pub duration_secs: Option<f64>,
}

#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    /// Download `source` into `work_dir`
    async fn acquire(&self, source: &str, work_dir: &Path) -> Result<AcquiredMedia>;
}

/// Factory for creating acquirer instances
pub struct AcquirerFactory;

impl AcquirerFactory {
    pub fn create_default(config: AcquireConfig) -> Box<dyn MediaAcquirer> {
        Box::new(YtDlpAcquirer::new(config))
    }
}
