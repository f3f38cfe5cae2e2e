//! Episodes command implementation.

use crate::cli::Output;
use crate::config::Config;
use crate::feed::{FeedIngester, FeedSource};
use anyhow::Result;

/// Run the episodes command.
pub async fn run_episodes(feed_url: &str, limit: Option<usize>, config: &Config) -> Result<()> {
    let limit = limit.unwrap_or(config.defaults.episode_limit).max(1);

    let ingester = FeedIngester::new();
    let spinner = Output::spinner("Fetching episodes...");
    let result = ingester.list(feed_url, limit).await;
    spinner.finish_and_clear();

    let listing = result?;

    if !listing.podcast_title.is_empty() {
        Output::info(&format!("Podcast: {}", listing.podcast_title));
    }
    println!(
        "Showing {} most recent episode(s):\n",
        listing.episodes.len()
    );

    for episode in &listing.episodes {
        Output::numbered(episode.index, &episode.title);
        let date = episode.pub_date.format("%Y-%m-%d").to_string();
        match episode.duration {
            Some(seconds) => Output::detail(&format!("{date} [{}]", format_duration(seconds))),
            None => Output::detail(&date),
        }
        println!();
    }

    Output::info("To transcribe an episode, use:");
    println!("  podtext transcribe \"{feed_url}\" <INDEX>");

    Ok(())
}

/// Format a duration in seconds as `H:MM:SS` or `M:SS`.
fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3665), "1:01:05");
    }
}
