use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::PaperError;

use super::{normalize_ws, strip_version, ARXIV_ABS_URL};

/// One candidate from the arXiv Atom feed, identifier already version-stripped.
#[derive(Debug, Clone)]
pub struct ArxivEntry {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Bibliographic lookup capability (the arXiv query API in production).
#[async_trait]
pub trait Bibliography: Send + Sync {
    async fn by_id(&self, id: &str) -> Result<Option<ArxivEntry>, PaperError>;
    async fn by_title(&self, query: &str) -> Result<Vec<ArxivEntry>, PaperError>;
}

pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    pub fn from_env() -> Result<Self> {
        let base_url = dotenv::var("BASE_URL_ARXIV")
            .unwrap_or_else(|_| "http://export.arxiv.org/api/query".to_string());
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, base_url })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Vec<ArxivEntry>, PaperError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        let body = resp.text().await?;
        let entries = parse_feed(&body);
        debug!(count = entries.len(), "arXiv feed parsed");
        Ok(entries)
    }
}

#[async_trait]
impl Bibliography for ArxivClient {
    async fn by_id(&self, id: &str) -> Result<Option<ArxivEntry>, PaperError> {
        let entries = self
            .query(&[("id_list", id), ("max_results", "1")])
            .await?;
        Ok(entries.into_iter().next())
    }

    async fn by_title(&self, query: &str) -> Result<Vec<ArxivEntry>, PaperError> {
        let search = format!("ti:\"{}\"", query);
        self.query(&[("search_query", search.as_str()), ("max_results", "10")])
            .await
    }
}

/// Event-based Atom parse; namespaces make regex scraping brittle here.
/// Entries missing an id or title are skipped.
fn parse_feed(xml: &str) -> Vec<ArxivEntry> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut tag = String::new();
    let mut id_url = String::new();
    let mut title = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "entry" {
                    in_entry = true;
                    id_url.clear();
                    title.clear();
                }
                tag = name;
            }
            Ok(Event::Text(t)) if in_entry => {
                let txt = t.unescape().map(|t| t.to_string()).unwrap_or_default();
                match tag.as_str() {
                    "id" => id_url.push_str(&txt),
                    "title" => {
                        // arXiv wraps long titles; keep the raw text and
                        // normalize once the entry closes
                        if !title.is_empty() {
                            title.push(' ');
                        }
                        title.push_str(&txt);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "entry" {
                    in_entry = false;
                    if let Some(entry) = entry_from_parts(&id_url, &title) {
                        entries.push(entry);
                    }
                }
                tag.clear();
            }
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    entries
}

fn entry_from_parts(id_url: &str, title: &str) -> Option<ArxivEntry> {
    // entry <id> is the abs URL, e.g. http://arxiv.org/abs/2303.08774v6
    let raw = id_url.trim().rsplit('/').next()?;
    let title = normalize_ws(title);
    if raw.is_empty() || title.is_empty() {
        return None;
    }
    let id = strip_version(raw);
    Some(ArxivEntry {
        url: format!("{}{}", ARXIV_ABS_URL, id),
        id,
        title,
    })
}
