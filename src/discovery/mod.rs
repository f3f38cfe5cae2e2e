//! Podcast discovery.

mod itunes;

pub use itunes::{ItunesClient, PodcastSearchResult};
