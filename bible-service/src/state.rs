use bible_core::{ChapterIndex, Config, QueryService};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

/// Immutable per-process settings. Handlers hold no mutable state; every
/// query re-reads the chapter directory.
pub struct AppState {
    pub root: PathBuf,
    pub public_dir: PathBuf,
    pub queries: Arc<QueryService>,
}

impl AppState {
    pub fn new(root: &Path, config: Config) -> Self {
        let index = ChapterIndex::new(config.chapters_dir(root));
        Self {
            root: root.to_path_buf(),
            public_dir: config.public_dir(root),
            queries: Arc::new(QueryService::new(index, config)),
        }
    }
}
