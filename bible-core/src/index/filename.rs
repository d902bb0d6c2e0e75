//! Chapter filename parsing: `NNN_BBB_CC.txt`.

use regex::Regex;
use std::sync::OnceLock;

/// Compiled filename pattern, built once per process.
static CHAPTER_FILENAME: OnceLock<Regex> = OnceLock::new();

fn pattern() -> &'static Regex {
    CHAPTER_FILENAME.get_or_init(|| {
        Regex::new(r"^\d{3}_([A-Z]{3}|\d[A-Z]{2})_(\d{2,3})\.txt$").unwrap()
    })
}

/// The (book, chapter) key encoded in a chapter filename
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterKey {
    pub book: String,
    pub chapter: u32,
}

impl ChapterKey {
    /// Parse a bare filename. Returns `None` for anything off-pattern,
    /// including a chapter number of zero.
    pub fn parse(filename: &str) -> Option<Self> {
        let caps = pattern().captures(filename)?;
        let chapter: u32 = caps[2].parse().ok()?;
        if chapter == 0 {
            return None;
        }
        Some(Self {
            book: caps[1].to_string(),
            chapter,
        })
    }
}

/// True when `filename` follows the chapter file naming contract
pub fn is_chapter_filename(filename: &str) -> bool {
    ChapterKey::parse(filename).is_some()
}
