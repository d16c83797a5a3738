use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use tracing::{info, warn};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, DubError};

/// Local store of ggml whisper models under `<app dir>/models`
#[derive(Clone)]
pub struct ModelManager {
    client: Client,
    app_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub size_mb: f64,
}

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

const KNOWN_MODELS: &[(&str, f64)] = &[
    ("tiny", 39.0),
    ("tiny.en", 39.0),
    ("base", 142.0),
    ("base.en", 142.0),
    ("small", 244.0),
    ("small.en", 244.0),
    ("medium", 769.0),
    ("medium.en", 769.0),
    ("large-v1", 1550.0),
    ("large-v2", 1550.0),
    ("large-v3", 1550.0),
];

impl ModelManager {
    pub fn new<P: AsRef<Path>>(app_dir: P) -> Result<Self> {
        let app_dir = app_dir.as_ref().to_path_buf();

        // Create models directory if it doesn't exist
        std::fs::create_dir_all(app_dir.join("models"))?;

        let client = Client::builder()
            .user_agent(concat!("farsi-dub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DubError::Http)?;

        Ok(Self { client, app_dir })
    }

    pub fn models_dir(&self) -> PathBuf {
        self.app_dir.join("models")
    }

    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        KNOWN_MODELS
            .iter()
            .map(|(name, size_mb)| {
                let filename = format!("ggml-{}.bin", name);
                ModelInfo {
                    name: name.to_string(),
                    url: format!("{}/{}", MODEL_BASE_URL, filename),
                    filename,
                    size_mb: *size_mb,
                }
            })
            .collect()
    }

    /// Return a local path for `model`, downloading it when missing.
    ///
    /// `model` may be a path to an existing file or a known model name.
    pub async fn ensure_model(&self, model: &str) -> Result<PathBuf> {
        let as_path = Path::new(model);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let info = self.select_appropriate_model(model)?;
        let local_path = self.models_dir().join(&info.filename);
        if local_path.is_file() {
            return Ok(local_path);
        }

        info!("Model not found locally: {}", info.name);
        self.download_model(&info).await
    }

    pub fn select_appropriate_model(&self, preferred: &str) -> Result<ModelInfo> {
        let models = self.get_available_models();

        // Try to find the exact preferred model
        if let Some(model) = models.iter().find(|m| m.name == preferred) {
            return Ok(model.clone());
        }

        // Fall back to base model if preferred not found
        if let Some(model) = models.iter().find(|m| m.name == "base") {
            warn!("Preferred model '{}' not found, using 'base' instead", preferred);
            return Ok(model.clone());
        }

        // Fall back to tiny model as last resort
        if let Some(model) = models.iter().find(|m| m.name == "tiny") {
            warn!("Base model not found, using 'tiny' instead");
            return Ok(model.clone());
        }

        Err(DubError::Config("No suitable whisper model found".to_string()))
    }

    pub fn is_downloaded(&self, model: &ModelInfo) -> bool {
        self.models_dir().join(&model.filename).is_file()
    }

    pub async fn download_model(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = self.models_dir().join(&model.filename);

        // Check if already exists
        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let mut response = self.client.get(&model.url).send().await?;

        if !response.status().is_success() {
            return Err(DubError::Config(format!(
                "Failed to download model {}: HTTP {}",
                model.name, response.status()
            )));
        }

        let total = response
            .content_length()
            .unwrap_or((model.size_mb * 1_000_000.0) as u64);
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        // Stream into a temporary file, then move into place
        let temp_path = local_path.with_extension("tmp");
        let mut file = async_fs::File::create(&temp_path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;
        drop(file);

        async_fs::rename(&temp_path, &local_path).await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let models = manager.get_available_models();

        let medium = models.iter().find(|m| m.name == "medium.en").unwrap();
        assert_eq!(medium.filename, "ggml-medium.en.bin");
        assert!(medium.url.ends_with("/ggml-medium.en.bin"));
        assert!(dir.path().join("models").is_dir());
    }

    #[test]
    fn test_unknown_model_falls_back_to_base() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        assert_eq!(manager.select_appropriate_model("huge-v9").unwrap().name, "base");
    }

    #[tokio::test]
    async fn test_existing_model_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let local = manager.models_dir().join("ggml-tiny.en.bin");
        std::fs::write(&local, b"ggml").unwrap();

        assert_eq!(manager.ensure_model("tiny.en").await.unwrap(), local);

        let custom = dir.path().join("custom.bin");
        std::fs::write(&custom, b"ggml").unwrap();
        assert_eq!(manager.ensure_model(custom.to_str().unwrap()).await.unwrap(), custom);
    }
}
