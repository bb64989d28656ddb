//! API key lookup
//!
//! Keys come from an ordered list of sources; the first one that yields a
//! non-empty value wins.

use std::env;

use thiserror::Error;
use tracing::debug;

use crate::Provider;

/// Environment variable checked for every provider.
pub const DOCSMITH_API_KEY: &str = "DOCSMITH_API_KEY";

#[derive(Debug, Error)]
#[error("no API key found for {provider} (tried: {})", tried.join(", "))]
pub struct ConfigurationError {
    pub provider: Provider,
    pub tried: Vec<String>,
}

type KeySource = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// Ordered list of key sources for one provider.
pub struct CredentialChain {
    provider: Provider,
    sources: Vec<(String, KeySource)>,
}

impl CredentialChain {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            sources: Vec::new(),
        }
    }

    /// The standard chain: explicit key, `DOCSMITH_API_KEY`, then the
    /// provider's own variable (`OPENAI_API_KEY`, ...).
    pub fn standard(provider: Provider, explicit: Option<String>) -> Self {
        Self::new(provider)
            .with_source("--api-key", move || explicit.clone())
            .with_env(DOCSMITH_API_KEY)
            .with_env(provider.key_variable())
    }

    pub fn with_source(
        mut self,
        name: impl Into<String>,
        source: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.sources.push((name.into(), Box::new(source)));
        self
    }

    pub fn with_env(self, variable: &'static str) -> Self {
        self.with_source(variable, move || env::var(variable).ok())
    }

    pub fn resolve(&self) -> Result<String, ConfigurationError> {
        for (name, source) in &self.sources {
            match source() {
                Some(key) if !key.trim().is_empty() => {
                    debug!(provider = %self.provider, source = %name, "API key found");
                    return Ok(key.trim().to_string());
                }
                _ => {}
            }
        }
        Err(ConfigurationError {
            provider: self.provider,
            tried: self.sources.iter().map(|(name, _)| name.clone()).collect(),
        })
    }
}
