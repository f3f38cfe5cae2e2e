//! Search command implementation.

use crate::cli::Output;
use crate::config::Config;
use crate::discovery::ItunesClient;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: Option<usize>, config: &Config) -> Result<()> {
    let limit = limit.unwrap_or(config.defaults.search_limit).max(1);

    let client = ItunesClient::new();
    let spinner = Output::spinner(&format!("Searching for '{query}'..."));
    let results = client.search_podcasts(query, limit).await;
    spinner.finish_and_clear();

    let podcasts = results?;

    if podcasts.is_empty() {
        Output::warning("No podcasts found.");
        return Ok(());
    }

    Output::success(&format!("Found {} podcast(s):", podcasts.len()));
    println!();

    for (i, podcast) in podcasts.iter().enumerate() {
        Output::numbered(i + 1, &podcast.title);
        if !podcast.author.is_empty() {
            Output::detail(&format!("by {}", podcast.author));
        }
        Output::detail(&format!("Feed: {}", podcast.feed_url));
        if !podcast.genre.is_empty() {
            Output::detail(&format!("Genre: {}", podcast.genre));
        }
        println!();
    }

    Output::info("To list episodes, use:");
    println!("  podtext episodes \"<FEED_URL>\"");

    Ok(())
}
