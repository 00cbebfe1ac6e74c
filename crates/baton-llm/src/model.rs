//! Provider tags and model settings

use crate::error::{Error, Result};
use crate::util::expand_env;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire-format family a model speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    /// OpenAI Responses-style typed content parts
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic content blocks
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Google Gemini `parts`
    #[serde(rename = "gemini")]
    Gemini,
    /// Chat-completions dialects served by many vendors
    #[serde(rename = "openai-compatible", alias = "openai_compatible")]
    OpenAiCompatible,
    /// Unrecognised
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl ProviderKind {
    /// All known providers, `Unknown` excluded
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::OpenAiCompatible,
    ];

    /// Directory-safe identifier
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::OpenAiCompatible => "openai-compatible",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "openai-compatible" | "openai_compatible" | "compatible" => {
                Ok(Self::OpenAiCompatible)
            }
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::NotConfigured(format!("unknown provider '{other}'"))),
        }
    }
}

/// Reasoning effort requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkLevel {
    /// No extended reasoning
    #[default]
    Off,
    /// Light reasoning
    Low,
    /// Moderate reasoning
    Medium,
    /// Maximum reasoning
    High,
}

impl ThinkLevel {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl From<bool> for ThinkLevel {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Medium
        } else {
            Self::Off
        }
    }
}

/// Model settings referenced by agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Wire-format family
    pub provider: ProviderKind,
    /// Model identifier sent to the vendor
    pub model: String,
    /// API endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Credential; may reference `${ENV}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Deterministic sampling seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ModelConfig {
    /// Create a new model configuration
    #[must_use]
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            endpoint: None,
            api_key: None,
            temperature: None,
            top_p: None,
            seed: None,
        }
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Credential with `${ENV}` references expanded
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(expand_env)
            .filter(|k| !k.is_empty())
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::NotConfigured("model id is empty".to_string()));
        }
        if self.provider == ProviderKind::Unknown {
            return Err(Error::NotConfigured(format!(
                "model '{}' has no provider",
                self.model
            )));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(Error::NotConfigured(format!(
                    "temperature {t} is outside 0.0..=2.0"
                )));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::NotConfigured(format!(
                    "top_p {p} is outside 0.0..=1.0"
                )));
            }
        }
        Ok(())
    }
}

fn default_max_results() -> u32 {
    5
}

/// Web search engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEngineConfig {
    /// Engine name (filled from the config key when omitted)
    #[serde(default)]
    pub name: String,
    /// Engine family, e.g. `tavily`, `bing`, `google`
    pub kind: String,
    /// Credential; may reference `${ENV}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Maximum results per query
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl SearchEngineConfig {
    /// Create a new search engine configuration
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            api_key: None,
            endpoint: None,
            max_results: default_max_results(),
        }
    }
}
