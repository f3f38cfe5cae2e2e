//! Configuration management for podtext.

mod prompts;
mod settings;

pub use prompts::{render_prompt, AnalysisPrompts};
pub use settings::{
    AnalysisSettings, ApiSettings, Config, DefaultsSettings, StorageSettings, WhisperSettings,
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, PROMPTS_FILE_NAME, VALID_WHISPER_MODELS,
};
