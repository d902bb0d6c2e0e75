//! Chapter index over a directory of `NNN_BBB_CC.txt` files.
//!
//! Filenames are the index: nothing is cached, every call re-reads the
//! directory so the file system stays the only source of truth.

mod filename;

pub use filename::{is_chapter_filename, ChapterKey};

use crate::error::BibleError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Header lines at the top of every chapter file that are not verses
const HEADER_LINES: usize = 2;

/// One chapter file, parsed fresh from disk
#[derive(Debug, Clone, Serialize)]
pub struct ChapterFile {
    pub book: String,
    pub chapter: u32,
    pub file: String,
    pub verses: Vec<String>,
}

/// All chapters known for one book code
#[derive(Debug, Clone, Serialize)]
pub struct BookIndexEntry {
    pub book: String,
    /// Sorted, de-duplicated chapter numbers
    pub chapters: Vec<u32>,
    /// Contributing filenames in lexicographic order
    pub files: Vec<String>,
}

/// Books in canonical order (order of first appearance in the sorted listing)
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookIndex {
    pub books: Vec<BookIndexEntry>,
}

impl BookIndex {
    pub fn get(&self, book: &str) -> Option<&BookIndexEntry> {
        self.books.iter().find(|entry| entry.book == book)
    }

    pub fn total_chapters(&self) -> usize {
        self.books.iter().map(|entry| entry.chapters.len()).sum()
    }
}

/// Filename and on-disk size
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub file: String,
    pub bytes: u64,
}

/// Read-only view of the chapter directory
#[derive(Debug, Clone)]
pub struct ChapterIndex {
    dir: PathBuf,
}

impl ChapterIndex {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Valid chapter filenames, sorted. A missing or unreadable directory
    /// yields an empty list. Only the name is checked, so a broken entry is
    /// still listed and fails when read.
    pub fn list_chapter_files(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %self.dir.display(), %err, "chapter directory unreadable");
                return Vec::new();
            }
        };

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map_or(false, |ft| !ft.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_chapter_filename(name))
            .collect();
        files.sort();
        files
    }

    /// Parse a chapter file, or `None` if the name is off-pattern or the
    /// file cannot be read.
    pub fn parse_chapter_file(&self, filename: &str) -> Option<ChapterFile> {
        self.read_chapter_file(filename).ok()
    }

    /// Fallible counterpart of [`parse_chapter_file`](Self::parse_chapter_file)
    /// for files that are already known to exist.
    pub fn read_chapter_file(&self, filename: &str) -> crate::Result<ChapterFile> {
        let key = ChapterKey::parse(filename)
            .ok_or_else(|| BibleError::invalid(format!("not a chapter file: {filename}")))?;
        let bytes = fs::read(self.dir.join(filename)).map_err(|source| BibleError::ChapterRead {
            file: filename.to_string(),
            source,
        })?;
        // Invalid UTF-8 becomes U+FFFD instead of failing the whole chapter
        let content = String::from_utf8_lossy(&bytes);

        Ok(ChapterFile {
            book: key.book,
            chapter: key.chapter,
            file: filename.to_string(),
            verses: split_verses(&content),
        })
    }

    /// Verse count of one file; 0 when unreadable
    pub fn verse_count(&self, filename: &str) -> usize {
        self.parse_chapter_file(filename)
            .map(|chapter| chapter.verses.len())
            .unwrap_or(0)
    }

    /// Group every chapter file by book code
    pub fn index_books(&self) -> BookIndex {
        self.index_files(&self.list_chapter_files())
    }

    /// Build a [`BookIndex`] from an already-sorted listing
    pub fn index_files(&self, files: &[String]) -> BookIndex {
        let mut books: Vec<BookIndexEntry> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for file in files {
            let Some(key) = ChapterKey::parse(file) else {
                continue;
            };
            let pos = *positions.entry(key.book.clone()).or_insert_with(|| {
                books.push(BookIndexEntry {
                    book: key.book.clone(),
                    chapters: Vec::new(),
                    files: Vec::new(),
                });
                books.len() - 1
            });
            let entry = &mut books[pos];
            entry.chapters.push(key.chapter);
            entry.files.push(file.clone());
        }

        for entry in &mut books {
            let before = entry.chapters.len();
            entry.chapters.sort_unstable();
            entry.chapters.dedup();
            if entry.chapters.len() != before {
                tracing::warn!(
                    book = %entry.book,
                    duplicates = before - entry.chapters.len(),
                    "duplicate chapter files; lexicographically first file wins"
                );
            }
        }

        BookIndex { books }
    }

    /// Filename for (book, chapter); the lexicographically first match wins
    pub fn find_chapter_file(&self, book: &str, chapter: u32) -> Option<String> {
        find_in(&self.list_chapter_files(), book, chapter)
    }

    /// Every chapter file with its size in bytes
    pub fn file_sizes(&self) -> crate::Result<Vec<FileEntry>> {
        self.list_chapter_files()
            .into_iter()
            .map(|file| {
                let bytes = fs::metadata(self.dir.join(&file))?.len();
                Ok(FileEntry { file, bytes })
            })
            .collect()
    }
}

/// Lookup over an existing sorted listing
pub fn find_in(files: &[String], book: &str, chapter: u32) -> Option<String> {
    files
        .iter()
        .find(|file| {
            ChapterKey::parse(file)
                .map(|key| key.book == book && key.chapter == chapter)
                .unwrap_or(false)
        })
        .cloned()
}

/// Drop the header lines and split the rest into verses. Trailing blank
/// lines are not verses.
fn split_verses(content: &str) -> Vec<String> {
    let mut verses: Vec<String> = content
        .lines()
        .skip(HEADER_LINES)
        .map(str::to_string)
        .collect();
    while verses.last().is_some_and(|v| v.trim().is_empty()) {
        verses.pop();
    }
    verses
}
