//! Bible Core - chapter-file index and verse queries
//!
//! Bible text lives in flat per-chapter files named `NNN_BBB_CC.txt`.
//! This library indexes them by filename and answers chapter, verse,
//! range, random-verse, and substring-search queries.

pub mod config;
pub mod error;
pub mod index;
pub mod query;

pub use config::{discover_project_root, Config};
pub use error::BibleError;
pub use index::{BookIndex, BookIndexEntry, ChapterFile, ChapterIndex, ChapterKey, FileEntry};
pub use query::{QueryService, RandomFilter, SearchParams};

/// Result type alias for bible-core operations
pub type Result<T> = std::result::Result<T, BibleError>;
