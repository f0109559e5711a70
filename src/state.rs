use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::llm::LlmClient;
use crate::paper::arxiv::ArxivClient;
use crate::paper::cache::PaperStore;
use crate::paper::convert::ArxivToMdClient;
use crate::paper::PaperSearcher;
use crate::reader::ReaderEngine;

/// Shared application state, built once per process from the environment.
#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<PaperSearcher>,
    pub reader: Arc<ReaderEngine>,
    /// Shared secret for the HTTP API; unset disables the check.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn from_env() -> Result<Self> {
        let store = PaperStore::from_env();
        info!(cache_dir = %store.dir().display(), "paper cache configured");

        let arxiv = Arc::new(ArxivClient::from_env()?);
        let converter = Arc::new(ArxivToMdClient::from_env()?);
        let searcher = Arc::new(PaperSearcher::new(store, arxiv, converter));

        let llm = Arc::new(LlmClient::from_env()?);
        let reader = Arc::new(ReaderEngine::new(llm));

        let api_key = dotenv::var("NEOCORTICA_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        Ok(Self {
            searcher,
            reader,
            api_key,
        })
    }
}
