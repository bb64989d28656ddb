//! Run configuration, assembled once from the command line and environment

use std::path::PathBuf;

use docsmith_docstring::PipelineOptions;
use docsmith_llm::{LlmClient, LlmError, Provider};

/// Settings for a `generate` run. Read-only once built.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub paths: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub provider: Provider,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub stream: bool,
    pub jobs: usize,
    pub override_existing: bool,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            override_existing: self.override_existing,
        }
    }

    /// Build the generator client. Fails when no API key can be found.
    pub fn client(&self) -> Result<LlmClient, LlmError> {
        let mut client = LlmClient::new(self.provider, self.api_key.clone())?.with_streaming(self.stream);
        if let Some(model) = &self.model {
            client = client.with_model(model.clone());
        }
        Ok(client)
    }
}
