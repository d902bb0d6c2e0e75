//! Error types for bible-core operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BibleError {
    #[error("{0}")]
    InvalidParam(String),

    #[error("book not found")]
    BookNotFound { book: String },

    #[error("chapter not found")]
    ChapterNotFound {
        book: String,
        requested_chapter: u32,
        available_chapters: Vec<u32>,
    },

    #[error("verse not found")]
    VerseNotFound {
        book: String,
        chapter: u32,
        verse: u32,
        verse_count: usize,
    },

    #[error("no chapters found in range")]
    EmptyRange { book: String, from: u32, to: u32 },

    #[error("no chapter files match the requested filters")]
    NoCandidates,

    #[error("bible directory missing or empty")]
    DirectoryMissing(PathBuf),

    #[error("failed to read chapter file {file}: {source}")]
    ChapterRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

impl BibleError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParam(msg.into())
    }
}
