// src/genai.rs

use crate::config::GenAiSection;
use tracing::{info, warn};

/// Handle to the optional generative-AI backend.
///
/// Built once at start-up and handed to the agent. Nothing in the
/// generation or extraction path talks to it; it only decides which
/// initialization message gets printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenAiClient {
    model: String,
}

impl GenAiClient {
    /// Resolve the client from config and the process environment.
    pub fn from_config(section: &GenAiSection) -> Option<Self> {
        Self::resolve(section, |name| std::env::var(name).ok())
    }

    /// Resolve the client using `lookup` for the credential.
    ///
    /// Returns `None` (fallback mode) when the client is disabled or the
    /// credential is missing or blank.
    pub fn resolve(
        section: &GenAiSection,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        if !section.enabled {
            info!("Generative AI client disabled in config");
            return None;
        }

        let has_key = lookup(&section.api_key_env).is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            warn!(var = %section.api_key_env, "API key not set, using fallback mode");
            return None;
        }

        if section.model.trim().is_empty() {
            warn!("No model configured, using fallback mode");
            return None;
        }

        info!(model = %section.model, "Generative AI client initialized");
        Some(Self {
            model: section.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}
