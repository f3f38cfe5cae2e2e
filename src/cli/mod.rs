//! CLI module for podtext.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// podtext - Podcast discovery, transcription, and AI-powered analysis.
///
/// Search for podcasts, list episodes, and transcribe them into markdown
/// documents with AI-generated summaries, topics, and keywords.
#[derive(Parser, Debug)]
#[command(name = "podtext")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for podcasts by name or keyword
    Search {
        /// Search term
        query: String,

        /// Maximum number of results (default: from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List recent episodes from a podcast feed
    Episodes {
        /// RSS feed URL (use 'podtext search' to find feeds)
        feed_url: String,

        /// Maximum number of episodes to show (default: from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Transcribe one or more episodes from a feed
    Transcribe {
        /// RSS feed URL
        feed_url: String,

        /// Episode numbers from 'podtext episodes' output
        #[arg(required = true)]
        indices: Vec<usize>,

        /// Whisper model to use (overrides config)
        #[arg(long)]
        model: Option<String>,

        /// Output directory (overrides config)
        #[arg(long)]
        output_dir: Option<String>,

        /// Skip language detection before transcribing
        #[arg(long)]
        skip_language_check: bool,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transcribe_accepts_multiple_indices() {
        let cli = Cli::parse_from([
            "podtext",
            "transcribe",
            "https://example.com/feed.xml",
            "3",
            "1",
            "2",
        ]);

        match cli.command {
            Commands::Transcribe { indices, .. } => assert_eq!(indices, vec![3, 1, 2]),
            _ => panic!("expected transcribe command"),
        }
    }

    #[test]
    fn test_transcribe_requires_index() {
        let result =
            Cli::try_parse_from(["podtext", "transcribe", "https://example.com/feed.xml"]);
        assert!(result.is_err());
    }
}
