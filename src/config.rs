use serde::Deserialize;
use std::{fs, path::Path};

/// Default location of the optional agent config, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/statement_agent.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub genai: GenAiSection,
}

/// Settings for the optional generative-AI client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenAiSection {
    pub enabled: bool,
    pub model: String,
    /// Name of the environment variable holding the API credential.
    pub api_key_env: String,
}

impl Default for GenAiSection {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
