//! Command implementations.

mod episodes;
mod search;
mod transcribe;

pub use episodes::run_episodes;
pub use search::run_search;
pub use transcribe::run_transcribe;
