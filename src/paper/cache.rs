use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::PaperError;

/// Filesystem markdown cache. Entries are named `<id>-<slug(title)>.md` and
/// their first line is always the `# <title>` heading written at fetch time.
/// The cache is unbounded and append-only; entries are never mutated in place.
pub struct PaperStore {
    dir: PathBuf,
}

impl PaperStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Self {
        let dir = dotenv::var("PAPER_CACHE").unwrap_or_else(|_| ".paper".to_string());
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str, slug: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.md", id, slug))
    }

    /// Pure existence check, no I/O beyond a stat.
    pub fn has(&self, path: &Path) -> bool {
        path.exists()
    }

    pub async fn read(&self, path: &Path) -> Result<String, PaperError> {
        Ok(fs::read_to_string(path).await?)
    }

    /// Write through a temp file and rename so a concurrent reader never
    /// observes a partial entry. Overwrites silently if the path exists.
    pub async fn write(&self, path: &Path, markdown: &str) -> Result<(), PaperError> {
        fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("md.tmp");
        fs::write(&tmp, markdown).await?;
        fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), size = markdown.len(), "paper cached");
        Ok(())
    }

    /// First cached entry whose filename starts with `<id>-`, if any.
    pub async fn find_by_id(&self, id: &str) -> Option<PathBuf> {
        let prefix = format!("{}-", id);
        let mut entries = fs::read_dir(&self.dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(".md") {
                return Some(entry.path());
            }
        }
        None
    }

    /// Title recorded in a cached entry's first line, stripped of its `# ` marker.
    pub async fn cached_title(&self, id: &str) -> Option<String> {
        let path = self.find_by_id(id).await?;
        let content = fs::read_to_string(&path).await.ok()?;
        let first = content.lines().next()?;
        first.strip_prefix("# ").map(|t| t.trim().to_string())
    }
}
