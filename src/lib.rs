//! podtext - Podcast discovery, transcription, and AI-powered analysis.
//!
//! A CLI tool that finds podcasts, fetches episode media from RSS feeds,
//! transcribes them with Whisper, enriches the transcript through the
//! Claude API, and writes a structured markdown document with YAML front
//! matter.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `discovery` - Podcast search (iTunes Search API)
//! - `feed` - RSS ingestion and episode indexing
//! - `media` - Episode media download
//! - `transcription` - Speech-to-text transcription
//! - `analysis` - AI analysis (summary, topics, keywords, ad detection)
//! - `output` - Markdown rendering and persistence
//! - `pipeline` - Pipeline orchestration and batch processing
//!
//! # Example
//!
//! ```rust,no_run
//! use podtext::config::Config;
//! use podtext::pipeline::{Orchestrator, TranscribeOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = Orchestrator::new(config);
//!
//!     let results = orchestrator
//!         .transcribe_batch(
//!             "https://example.com/feed.xml",
//!             &[1, 2],
//!             &TranscribeOptions::default(),
//!         )
//!         .await;
//!     println!("{} episode(s) processed", results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod feed;
pub mod media;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod transcription;

pub use error::{PodtextError, Result};
