use thiserror::Error;

/// Failures surfaced by paper resolution, caching, and the reading pipeline.
#[derive(Error, Debug)]
pub enum PaperError {
    #[error("need at least an id, url, or title")]
    MissingIdentity,

    /// arXiv lookup for a known identifier returned no entry.
    #[error("no title found for {0}")]
    TitleNotFound(String),

    /// Title-only search found no exact match; no identifier is known.
    #[error("no arXiv entry matching title \"{0}\"; provide an id or url")]
    UnresolvedTitle(String),

    #[error("arxiv2md returned {0}")]
    ConversionStatus(u16),

    /// Transport failure (including timeout) talking to the conversion service.
    #[error("arxiv2md request failed: {0}")]
    ConversionRequest(#[source] reqwest::Error),

    #[error("arxiv2md returned empty content")]
    EmptyContent,

    #[error("cache i/o failed: {0}")]
    Cache(#[from] std::io::Error),

    #[error("completion service failed: {0}")]
    CompletionService(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
