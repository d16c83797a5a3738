//! farsi-dub - English to Farsi video dubbing
//!
//! Transcribes a source video, translates it segment by segment, and
//! rebuilds a time-aligned Farsi audio track that replaces the original.

pub mod acquire;
pub mod audio;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod segment;
pub mod setup;
pub mod synthesis;
pub mod text;
pub mod timeline;
pub mod transcribe;
pub mod translate;
pub mod workflow;
