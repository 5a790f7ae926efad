//! In-process fakes for the generation and search collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use brandcast_llm::{GenerationRequest, TextGenerator};
use brandcast_search::{SearchHit, SearchProvider};
use brandcast_shared::{BrandcastError, Result};

type Script = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Answers every prompt through a closure and records what it was asked.
pub(crate) struct ScriptedGenerator {
    script: Box<Script>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(
        script: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub(crate) fn temperatures(&self) -> Vec<f32> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.temperature)
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(&request.prompt)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Returns the same hits for every query, except queries containing a
/// failure marker, which error.
pub(crate) struct StaticSearch {
    hits: Vec<SearchHit>,
    fail_when: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub(crate) fn new(hits: Vec<SearchHit>) -> Arc<Self> {
        Self::with_failures(hits, &[])
    }

    pub(crate) fn with_failures(hits: Vec<SearchHit>, fail_when: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            hits,
            fail_when: fail_when.iter().map(|s| s.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail_when.iter().any(|m| query.contains(m.as_str())) {
            return Err(BrandcastError::Search(format!("scripted failure for '{query}'")));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
