use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser)]
#[command(author, version, about = "Dub English videos into Farsi", long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dub a single video
    Dub {
        /// Source video URL
        url: String,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Dub every URL listed in a file, one after another
    Batch {
        /// File with one URL per line; blank lines and `#` comments are ignored
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        job: JobArgs,
    },

    /// List available whisper models and their status
    Models {
        /// Download all missing models
        #[arg(long)]
        download: bool,
    },

    /// Write the default configuration as TOML
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "farsi-dub.toml")]
        path: PathBuf,
    },
}

/// Per-run overrides shared by `dub` and `batch`
#[derive(clap::Args, Debug, Default)]
pub struct JobArgs {
    /// Output directory [default: Farsi_Dubbed_Output]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Whisper model size or path to a ggml model [default: medium.en]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Voice for Farsi segments [default: fa-IR-DilaraNeural]
    #[arg(long)]
    pub voice: Option<String>,

    /// Voice for segments kept in English [default: en-US-AriaNeural]
    #[arg(long)]
    pub english_voice: Option<String>,
}

impl JobArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(model) = &self.model {
            config.transcriber.model = model.clone();
        }
        if let Some(voice) = &self.voice {
            config.synthesis.farsi_voice = voice.clone();
        }
        if let Some(voice) = &self.english_voice {
            config.synthesis.english_voice = voice.clone();
        }
    }
}

/// Parse a batch file into the URLs it lists
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dub_command() {
        let args = Args::try_parse_from([
            "farsi-dub", "-v", "dub", "https://youtu.be/abc", "--model", "small.en", "--voice", "fa-IR-FaridNeural",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Dub { url, job } => {
                assert_eq!(url, "https://youtu.be/abc");
                assert_eq!(job.model.as_deref(), Some("small.en"));
                assert_eq!(job.voice.as_deref(), Some("fa-IR-FaridNeural"));
                assert!(job.output.is_none());
            }
            _ => panic!("expected dub"),
        }
    }

    #[test]
    fn test_job_args_override_config() {
        let mut config = Config::default();
        let job = JobArgs {
            output: Some(PathBuf::from("out")),
            english_voice: Some("en-GB-SoniaNeural".to_string()),
            ..Default::default()
        };
        job.apply(&mut config);

        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.synthesis.english_voice, "en-GB-SoniaNeural");
        assert_eq!(config.synthesis.farsi_voice, "fa-IR-DilaraNeural");
        assert_eq!(config.transcriber.model, "medium.en");
    }

    #[test]
    fn test_parse_url_list() {
        let urls = parse_url_list("# lectures\nhttps://a\n\n  https://b  \n#https://c\n");
        assert_eq!(urls, vec!["https://a", "https://b"]);
    }
}
