//! Flavor text for bestiary lookups.
//!
//! A [`FlavorSource`] is chosen once per process and injected into each
//! [`GameState`](super::commands::GameState). Whatever the source does, a
//! lookup always produces text: failures, timeouts and placeholder answers
//! fall back to a seeded one-line epithet.

use std::sync::Arc;

use log::{debug, warn};

use super::rng::rng_for;
use crate::config::FlavorConfig;

/// External text generator. Returning `None` means "use the fallback".
pub trait FlavorSource: Send + Sync {
    fn generate(&self, prompt: &str) -> Option<String>;
}

/// Source that never answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFlavor;

impl FlavorSource for NoFlavor {
    fn generate(&self, _prompt: &str) -> Option<String> {
        None
    }
}

/// Empty, whitespace-only, or a bracketed placeholder like `[flavor unavailable]`.
pub fn is_degenerate(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || (t.starts_with('[') && t.ends_with(']'))
}

const EPITHET_OPENERS: [&str; 5] = [
    "Gnaws at",
    "Feeds on",
    "Dreams of",
    "Hoards",
    "Follows",
];
const EPITHET_OBJECTS: [&str; 6] = [
    "the bones of the drowned",
    "lantern light",
    "salt and old iron",
    "whatever the fen gives up",
    "the footsteps of the lost",
    "forgotten names",
];

/// Deterministic one-line description seeded by `("bestiary", name)`.
pub fn fallback_epithet(name: &str) -> String {
    let mut rng = rng_for(&[&"bestiary", &name]);
    let opener = rng.pick(&EPITHET_OPENERS);
    let object = rng.pick(&EPITHET_OBJECTS);
    format!("{}: {} {}.", name, opener, object)
}

/// Bestiary entry for `name`: the collaborator's text when usable, otherwise
/// the seeded epithet.
pub fn bestiary_entry(source: &dyn FlavorSource, name: &str) -> String {
    let prompt = format!(
        "Write a two-line bestiary entry for a creature called the {}.",
        name
    );
    match source.generate(&prompt) {
        Some(text) if !is_degenerate(&text) => format!("{}\n{}", name, text.trim()),
        Some(_) => {
            debug!("Degenerate flavor text for {}, using fallback", name);
            fallback_epithet(name)
        }
        None => fallback_epithet(name),
    }
}

/// Pick the process-wide flavor source from configuration.
///
/// Builds a blocking HTTP client when enabled, so call it from a thread that
/// is allowed to block (not directly on an async worker).
pub fn flavor_from_config(config: &FlavorConfig) -> Arc<dyn FlavorSource> {
    if !config.enabled {
        debug!("Flavor service is disabled");
        return Arc::new(NoFlavor);
    }
    if config.api_key.is_empty() {
        warn!("Flavor service enabled but no API key configured");
        return Arc::new(NoFlavor);
    }
    build_remote(config)
}

#[cfg(feature = "flavor")]
fn build_remote(config: &FlavorConfig) -> Arc<dyn FlavorSource> {
    match gemini::GeminiFlavor::new(config.clone()) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            warn!("Failed to build flavor client: {}", e);
            Arc::new(NoFlavor)
        }
    }
}

#[cfg(not(feature = "flavor"))]
fn build_remote(_config: &FlavorConfig) -> Arc<dyn FlavorSource> {
    warn!("Flavor service enabled but this build lacks the `flavor` feature");
    Arc::new(NoFlavor)
}

#[cfg(feature = "flavor")]
pub use gemini::GeminiFlavor;

#[cfg(feature = "flavor")]
mod gemini {
    use std::time::Duration;

    use log::{debug, warn};
    use serde::{Deserialize, Serialize};

    use super::{is_degenerate, FlavorSource};
    use crate::config::FlavorConfig;
    use crate::engine::errors::{EngineError, Result};

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct GenerateRequest<'a> {
        contents: Vec<Content<'a>>,
        system_instruction: Content<'a>,
        generation_config: GenerationConfig,
    }

    #[derive(Debug, Serialize)]
    struct Content<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<&'a str>,
        parts: Vec<Part<'a>>,
    }

    #[derive(Debug, Serialize)]
    struct Part<'a> {
        text: &'a str,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct GenerationConfig {
        temperature: f32,
        thinking_config: ThinkingConfig,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ThinkingConfig {
        thinking_budget: i32,
    }

    /// API response structures (only the fields we read)
    #[derive(Debug, Deserialize)]
    pub(super) struct GenerateResponse {
        #[serde(default)]
        candidates: Vec<Candidate>,
    }

    #[derive(Debug, Deserialize)]
    struct Candidate {
        content: Option<CandidateContent>,
    }

    #[derive(Debug, Deserialize)]
    struct CandidateContent {
        #[serde(default)]
        parts: Vec<CandidatePart>,
    }

    #[derive(Debug, Deserialize)]
    struct CandidatePart {
        text: Option<String>,
    }

    impl GenerateResponse {
        /// Concatenated text of the first candidate.
        pub(super) fn text(&self) -> Option<String> {
            let content = self.candidates.first()?.content.as_ref()?;
            let joined: String = content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect();
            let joined = joined.trim().to_string();
            (!is_degenerate(&joined)).then_some(joined)
        }
    }

    /// Gemini `generateContent` client with a bounded timeout.
    pub struct GeminiFlavor {
        config: FlavorConfig,
        client: reqwest::blocking::Client,
    }

    impl GeminiFlavor {
        pub fn new(config: FlavorConfig) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .map_err(|e| EngineError::Flavor(format!("client build failed: {}", e)))?;
            Ok(Self { config, client })
        }

        pub fn url(&self) -> String {
            format!(
                "{}/models/{}:generateContent",
                self.config.endpoint.trim_end_matches('/'),
                self.config.model
            )
        }

        fn request(&self, prompt: &str) -> Result<String> {
            let body = GenerateRequest {
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![Part { text: prompt }],
                }],
                system_instruction: Content {
                    role: None,
                    parts: vec![Part {
                        text: &self.config.system_prompt,
                    }],
                },
                generation_config: GenerationConfig {
                    temperature: self.config.temperature,
                    thinking_config: ThinkingConfig {
                        thinking_budget: self.config.thinking_budget,
                    },
                },
            };
            let url = self.url();
            debug!("Requesting flavor text from {}", url);
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.config.api_key)
                .json(&body)
                .send()
                .map_err(|e| EngineError::Flavor(format!("HTTP request failed: {}", e)))?;
            if !response.status().is_success() {
                return Err(EngineError::Flavor(format!(
                    "API returned status: {}",
                    response.status()
                )));
            }
            let parsed: GenerateResponse = response
                .json()
                .map_err(|e| EngineError::Flavor(format!("Failed to parse JSON response: {}", e)))?;
            parsed
                .text()
                .ok_or_else(|| EngineError::Flavor("empty response".to_string()))
        }
    }

    impl FlavorSource for GeminiFlavor {
        fn generate(&self, prompt: &str) -> Option<String> {
            match self.request(prompt) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Flavor generation failed: {}", e);
                    None
                }
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    impl FlavorSource for Canned {
        fn generate(&self, _prompt: &str) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn degenerate_detection() {
        assert!(is_degenerate(""));
        assert!(is_degenerate("   \n"));
        assert!(is_degenerate("[flavor unavailable]"));
        assert!(!is_degenerate("A rat the size of a dog."));
    }

    #[test]
    fn fallback_is_deterministic_and_named() {
        let a = fallback_epithet("Carrion Rat");
        assert_eq!(a, fallback_epithet("Carrion Rat"));
        assert!(a.starts_with("Carrion Rat: "));
        assert_eq!(a.lines().count(), 1);
    }

    #[test]
    fn entry_prefers_collaborator_text() {
        let out = bestiary_entry(&Canned("  Lean, patient, hungry.  "), "Carrion Rat");
        assert_eq!(out, "Carrion Rat\nLean, patient, hungry.");
    }

    #[test]
    fn entry_falls_back_on_placeholder_or_silence() {
        let expected = fallback_epithet("Carrion Rat");
        assert_eq!(bestiary_entry(&Canned("[flavor unavailable]"), "Carrion Rat"), expected);
        assert_eq!(bestiary_entry(&NoFlavor, "Carrion Rat"), expected);
    }

    #[test]
    fn disabled_config_selects_no_flavor() {
        let source = flavor_from_config(&FlavorConfig::default());
        assert!(source.generate("anything").is_none());
        let mut config = FlavorConfig::default();
        config.enabled = true;
        let source = flavor_from_config(&config);
        assert!(source.generate("anything").is_none());
    }
}
