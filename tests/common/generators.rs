use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use docsmith_docstring::{DocKind, Generation, Generator, GeneratorError};

/// Name of the definition a fragment starts with.
pub fn fragment_name(fragment: &str) -> String {
    let header = fragment.lines().next().unwrap_or_default().trim_start();
    let header = header.strip_prefix("async ").unwrap_or(header);
    let rest = header
        .strip_prefix("def ")
        .or_else(|| header.strip_prefix("class "))
        .unwrap_or(header);
    rest.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Answers by definition name. `None` entries and unknown names fail.
#[derive(Default)]
pub struct Scripted {
    answers: HashMap<String, Option<String>>,
    seen: Mutex<Vec<(String, DocKind, String)>>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, text: &str) -> Self {
        self.answers.insert(name.to_string(), Some(text.to_string()));
        self
    }

    pub fn fail(mut self, name: &str) -> Self {
        self.answers.insert(name.to_string(), None);
        self
    }

    /// `(name, kind, fragment)` for every request made so far
    pub fn requests(&self) -> Vec<(String, DocKind, String)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn fragment_for(&self, name: &str) -> Option<String> {
        self.requests()
            .into_iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, fragment)| fragment)
    }
}

#[async_trait]
impl Generator for Scripted {
    async fn generate(&self, fragment: &str, kind: DocKind) -> Result<Generation, GeneratorError> {
        let name = fragment_name(fragment);
        self.seen
            .lock()
            .unwrap()
            .push((name.clone(), kind, fragment.to_string()));
        match self.answers.get(&name) {
            Some(Some(text)) => Ok(Generation::Complete(text.clone())),
            _ => Err(GeneratorError::Transport(format!("no answer for {name}"))),
        }
    }
}

/// Documents everything with `"<kind> <name>."`.
pub struct Describe;

#[async_trait]
impl Generator for Describe {
    async fn generate(&self, fragment: &str, kind: DocKind) -> Result<Generation, GeneratorError> {
        Ok(Generation::Complete(format!("{kind} {}.", fragment_name(fragment))))
    }
}
