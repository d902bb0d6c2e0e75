//! Read-only queries answered from the chapter index.
//!
//! Each operation re-scans the chapter directory; nothing is shared between
//! calls. Verse numbers are 1-indexed everywhere.

use crate::config::Config;
use crate::error::BibleError;
use crate::index::{find_in, ChapterFile, ChapterIndex, ChapterKey, FileEntry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Shortest accepted search query, in characters
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub bible_dir: String,
    pub exists: bool,
    pub files: usize,
}

impl Health {
    pub fn is_ready(&self) -> bool {
        self.exists && self.files > 0
    }
}

#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub book: String,
    pub chapters: usize,
}

#[derive(Debug, Serialize)]
pub struct BookList {
    pub count: usize,
    pub items: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct BookChapters {
    pub book: String,
    pub count: usize,
    pub chapters: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeta {
    pub book: String,
    pub chapters: usize,
    pub total_verses: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Chapter {
    pub book: String,
    pub chapter: u32,
    pub file: String,
    pub count: usize,
    pub verses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VerseStats {
    pub verse: usize,
    pub words: usize,
    pub chars: usize,
}

#[derive(Debug, Serialize)]
pub struct ChapterVerses {
    pub book: String,
    pub chapter: u32,
    pub count: usize,
    pub items: Vec<VerseStats>,
}

/// Optional filters for [`QueryService::random_verse`]
#[derive(Debug, Clone, Default)]
pub struct RandomFilter {
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub seed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RandomVerse {
    pub book: String,
    pub chapter: u32,
    pub verse: usize,
    pub text: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub q: String,
    pub book: Option<String>,
    /// Requested hit limit; `None` means the configured default
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub book: String,
    pub chapter: u32,
    pub verse: usize,
    pub text: String,
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<String>,
    pub limit: usize,
    pub count: usize,
    pub items: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub count: usize,
    pub items: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
}

#[derive(Debug, Serialize)]
pub struct RangeItem {
    pub chapter: u32,
    pub file: String,
    pub verses: usize,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct ChapterRange {
    pub book: String,
    pub from: u32,
    pub to: u32,
    pub count: usize,
    pub items: Vec<RangeItem>,
}

#[derive(Debug, Serialize)]
pub struct Verse {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

/// Query layer over one chapter directory
#[derive(Debug, Clone)]
pub struct QueryService {
    index: ChapterIndex,
    config: Config,
}

impl QueryService {
    pub fn new(index: ChapterIndex, config: Config) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &ChapterIndex {
        &self.index
    }

    pub fn health(&self) -> Health {
        Health {
            bible_dir: self.index.dir().display().to_string(),
            exists: self.index.exists(),
            files: self.index.list_chapter_files().len(),
        }
    }

    pub fn books(&self) -> BookList {
        let items: Vec<BookSummary> = self
            .index
            .index_books()
            .books
            .into_iter()
            .map(|entry| BookSummary {
                book: entry.book,
                chapters: entry.chapters.len(),
            })
            .collect();
        BookList {
            count: items.len(),
            items,
        }
    }

    pub fn book_chapters(&self, book: &str) -> crate::Result<BookChapters> {
        let books = self.index.index_books();
        let entry = books.get(book).ok_or_else(|| book_not_found(book))?;
        Ok(BookChapters {
            book: entry.book.clone(),
            count: entry.chapters.len(),
            chapters: entry.chapters.clone(),
        })
    }

    pub fn book_meta(&self, book: &str) -> crate::Result<BookMeta> {
        let books = self.index.index_books();
        let entry = books.get(book).ok_or_else(|| book_not_found(book))?;
        let total_verses = entry
            .files
            .iter()
            .map(|file| self.index.verse_count(file))
            .sum();
        Ok(BookMeta {
            book: entry.book.clone(),
            chapters: entry.chapters.len(),
            total_verses,
            files: entry.files.clone(),
        })
    }

    pub fn chapter(&self, book: &str, chapter: u32) -> crate::Result<Chapter> {
        let file = self.locate(book, chapter)?;
        let parsed = self.index.read_chapter_file(&file)?;
        Ok(Chapter {
            book: parsed.book,
            chapter: parsed.chapter,
            file: parsed.file,
            count: parsed.verses.len(),
            verses: parsed.verses,
        })
    }

    pub fn chapter_verses(&self, book: &str, chapter: u32) -> crate::Result<ChapterVerses> {
        let chapter = self.chapter(book, chapter)?;
        let items: Vec<VerseStats> = chapter
            .verses
            .iter()
            .enumerate()
            .map(|(i, text)| VerseStats {
                verse: i + 1,
                words: text.split_whitespace().count(),
                chars: text.chars().count(),
            })
            .collect();
        Ok(ChapterVerses {
            book: chapter.book,
            chapter: chapter.chapter,
            count: items.len(),
            items,
        })
    }

    /// Uniform chapter file from the candidate set, then a uniform verse in
    /// it. Unreadable or verse-less chapters are not candidates. The same
    /// seed over the same data always picks the same verse.
    pub fn random_verse(&self, filter: &RandomFilter) -> crate::Result<RandomVerse> {
        let files = self.index.list_chapter_files();
        if files.is_empty() {
            return Err(BibleError::DirectoryMissing(self.index.dir().to_path_buf()));
        }

        // Only chapters that have at least one verse are eligible
        let candidates: Vec<ChapterFile> = files
            .iter()
            .filter(|file| {
                let Some(key) = ChapterKey::parse(file) else {
                    return false;
                };
                filter.book.as_deref().map_or(true, |b| key.book == b)
                    && filter.chapter.map_or(true, |c| key.chapter == c)
            })
            .filter_map(|file| self.index.parse_chapter_file(file))
            .filter(|chapter| !chapter.verses.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(BibleError::NoCandidates);
        }

        let mut rng = match filter.seed.as_deref() {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed_to_u64(seed)),
            None => ChaCha8Rng::from_entropy(),
        };

        let chapter = &candidates[rng.gen_range(0..candidates.len())];
        let idx = rng.gen_range(0..chapter.verses.len());
        Ok(RandomVerse {
            book: chapter.book.clone(),
            chapter: chapter.chapter,
            verse: idx + 1,
            text: chapter.verses[idx].clone(),
            file: chapter.file.clone(),
            seed: filter.seed.clone(),
        })
    }

    /// Case-insensitive substring search in filename order, stopping at the limit
    pub fn search(&self, params: &SearchParams) -> crate::Result<SearchResults> {
        if params.q.chars().count() < MIN_QUERY_CHARS {
            return Err(BibleError::invalid(format!(
                "q must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        let limit = self.resolve_limit(params.limit);
        let needle = params.q.to_lowercase();

        let mut items = Vec::new();
        'files: for file in self.index.list_chapter_files() {
            if let Some(book) = params.book.as_deref() {
                if ChapterKey::parse(&file).map_or(true, |key| key.book != book) {
                    continue;
                }
            }
            let Some(chapter) = self.index.parse_chapter_file(&file) else {
                continue;
            };
            for (i, text) in chapter.verses.iter().enumerate() {
                if items.len() >= limit {
                    break 'files;
                }
                if text.to_lowercase().contains(&needle) {
                    items.push(SearchHit {
                        book: chapter.book.clone(),
                        chapter: chapter.chapter,
                        verse: i + 1,
                        text: text.clone(),
                        file: chapter.file.clone(),
                    });
                }
            }
        }

        Ok(SearchResults {
            q: params.q.clone(),
            book: params.book.clone(),
            limit,
            count: items.len(),
            items,
        })
    }

    pub fn files(&self) -> crate::Result<FileList> {
        let items = self.index.file_sizes()?;
        Ok(FileList {
            count: items.len(),
            items,
        })
    }

    pub fn stats(&self) -> Stats {
        let files = self.index.list_chapter_files();
        let books = self.index.index_files(&files);
        Stats {
            books: books.books.len(),
            chapters: books.total_chapters(),
            verses: files.iter().map(|file| self.index.verse_count(file)).sum(),
        }
    }

    pub fn range(&self, book: &str, from: u32, to: u32) -> crate::Result<ChapterRange> {
        if to < from {
            return Err(BibleError::invalid("to must be >= from"));
        }
        let files = self.index.list_chapter_files();
        let books = self.index.index_files(&files);
        let chapters = books
            .get(book)
            .map(|entry| entry.chapters.as_slice())
            .unwrap_or_default();

        let preview_chars = self.config.range.preview_chars;
        let mut items = Vec::new();
        for &chapter in chapters.iter().filter(|&&c| c >= from && c <= to) {
            let Some(file) = find_in(&files, book, chapter) else {
                continue;
            };
            let parsed = self.index.parse_chapter_file(&file);
            let verses = parsed.as_ref().map_or(0, |c| c.verses.len());
            let preview = parsed
                .as_ref()
                .and_then(|c| c.verses.first())
                .map(|first| first.chars().take(preview_chars).collect())
                .unwrap_or_default();
            items.push(RangeItem {
                chapter,
                file,
                verses,
                preview,
            });
        }

        if items.is_empty() {
            return Err(BibleError::EmptyRange {
                book: book.to_string(),
                from,
                to,
            });
        }

        Ok(ChapterRange {
            book: book.to_string(),
            from,
            to,
            count: items.len(),
            items,
        })
    }

    pub fn verse(&self, book: &str, chapter: u32, verse: u32) -> crate::Result<Verse> {
        let file = self.locate(book, chapter)?;
        let parsed = self.index.read_chapter_file(&file)?;
        let text = (verse as usize)
            .checked_sub(1)
            .and_then(|i| parsed.verses.get(i))
            .ok_or_else(|| BibleError::VerseNotFound {
                book: book.to_string(),
                chapter,
                verse,
                verse_count: parsed.verses.len(),
            })?;
        Ok(Verse {
            book: parsed.book.clone(),
            chapter,
            verse,
            text: text.clone(),
        })
    }

    /// Clamp a requested limit to `1..=max_limit`, using the default when absent
    fn resolve_limit(&self, requested: Option<usize>) -> usize {
        let search = &self.config.search;
        requested
            .filter(|&n| n > 0)
            .unwrap_or(search.default_limit)
            .min(search.max_limit)
            .max(1)
    }

    /// Chapter filename, distinguishing an unknown book from a missing chapter
    fn locate(&self, book: &str, chapter: u32) -> crate::Result<String> {
        let files = self.index.list_chapter_files();
        if let Some(file) = find_in(&files, book, chapter) {
            return Ok(file);
        }
        let books = self.index.index_files(&files);
        match books.get(book) {
            Some(entry) => Err(BibleError::ChapterNotFound {
                book: book.to_string(),
                requested_chapter: chapter,
                available_chapters: entry.chapters.clone(),
            }),
            None => Err(book_not_found(book)),
        }
    }
}

fn book_not_found(book: &str) -> BibleError {
    BibleError::BookNotFound {
        book: book.to_string(),
    }
}

/// Numeric seeds are used as-is; anything else is hashed
fn seed_to_u64(seed: &str) -> u64 {
    if let Ok(n) = seed.trim().parse::<u64>() {
        return n;
    }
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_chapter(dir: &Path, name: &str, verses: &[&str]) {
        let mut content = String::from("Title line\nSubtitle line\n");
        for v in verses {
            content.push_str(v);
            content.push('\n');
        }
        fs::write(dir.join(name), content).unwrap();
    }

    fn setup() -> (TempDir, QueryService) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_chapter(
            root,
            "001_GEN_01.txt",
            &[
                "In the beginning God created the heaven and the earth.",
                "And the earth was without form, and void.",
                "And God said, Let there be light: and there was light.",
            ],
        );
        write_chapter(
            root,
            "001_GEN_02.txt",
            &["Thus the heavens and the earth were finished."],
        );
        write_chapter(root, "001_GEN_04.txt", &["And Adam knew Eve his wife."]);
        write_chapter(
            root,
            "043_JHN_01.txt",
            &["In the beginning was the Word.", "The same was in the beginning with God."],
        );
        let service = QueryService::new(ChapterIndex::new(root), Config::default());
        (dir, service)
    }

    #[test]
    fn test_health_reports_missing_dir() {
        let service = QueryService::new(ChapterIndex::new("/nonexistent/bible"), Config::default());
        let health = service.health();
        assert!(!health.exists);
        assert!(!health.is_ready());
    }

    #[test]
    fn test_books_and_chapters_agree() {
        let (_dir, service) = setup();
        let books = service.books();
        assert_eq!(books.count, 2);
        for summary in &books.items {
            let chapters = service.book_chapters(&summary.book).unwrap();
            assert!(!chapters.chapters.is_empty());
            assert_eq!(chapters.count, summary.chapters);
        }
        assert!(matches!(
            service.book_chapters("XXX"),
            Err(BibleError::BookNotFound { .. })
        ));
    }

    #[test]
    fn test_stats_match_book_meta() {
        let (_dir, service) = setup();
        let stats = service.stats();
        assert_eq!(stats.books, 2);
        assert_eq!(stats.chapters, 4);
        let summed: usize = service
            .books()
            .items
            .iter()
            .map(|b| service.book_meta(&b.book).unwrap().total_verses)
            .sum();
        assert_eq!(stats.verses, summed);
        assert_eq!(stats.verses, 7);
    }

    #[test]
    fn test_chapter_and_verse_agree() {
        let (_dir, service) = setup();
        let chapter = service.chapter("GEN", 1).unwrap();
        assert_eq!(chapter.count, 3);
        for (i, text) in chapter.verses.iter().enumerate() {
            let verse = service.verse("GEN", 1, i as u32 + 1).unwrap();
            assert_eq!(&verse.text, text);
        }
    }

    #[test]
    fn test_chapter_not_found_lists_available() {
        let (_dir, service) = setup();
        match service.verse("GEN", 3, 1) {
            Err(BibleError::ChapterNotFound {
                requested_chapter,
                available_chapters,
                ..
            }) => {
                assert_eq!(requested_chapter, 3);
                assert_eq!(available_chapters, vec![1, 2, 4]);
            }
            other => panic!("expected ChapterNotFound, got {other:?}"),
        }
        assert!(matches!(
            service.verse("XXX", 1, 1),
            Err(BibleError::BookNotFound { .. })
        ));
        assert!(matches!(
            service.verse("GEN", 1, 4),
            Err(BibleError::VerseNotFound { verse_count: 3, .. })
        ));
    }

    #[test]
    fn test_chapter_verses_counts() {
        let (_dir, service) = setup();
        let stats = service.chapter_verses("GEN", 2).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.items[0].verse, 1);
        assert_eq!(stats.items[0].words, 8);
        assert_eq!(stats.items[0].chars, 45);
    }

    #[test]
    fn test_search_respects_limit_and_case() {
        let (_dir, service) = setup();
        let results = service
            .search(&SearchParams {
                q: "BEGINNING".to_string(),
                book: None,
                limit: Some(2),
            })
            .unwrap();
        assert_eq!(results.count, 2);
        assert_eq!(results.items.len(), results.count);
        assert!(results
            .items
            .iter()
            .all(|hit| hit.text.to_lowercase().contains("beginning")));
        assert_eq!(results.items[0].book, "GEN");
        assert_eq!(results.items[1].book, "JHN");
    }

    #[test]
    fn test_search_book_filter_and_default_limit() {
        let (_dir, service) = setup();
        let results = service
            .search(&SearchParams {
                q: "beginning".to_string(),
                book: Some("JHN".to_string()),
                limit: None,
            })
            .unwrap();
        assert_eq!(results.limit, 25);
        assert_eq!(results.count, 2);
        assert!(results.items.iter().all(|hit| hit.book == "JHN"));
        assert_eq!(results.items[1].verse, 2);
    }

    #[test]
    fn test_search_rejects_short_query() {
        let (_dir, service) = setup();
        let err = service
            .search(&SearchParams {
                q: "a".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "q must be at least 2 characters");
    }

    #[test]
    fn test_range_matches_present_chapters() {
        let (_dir, service) = setup();
        let range = service.range("GEN", 2, 10).unwrap();
        let chapters: Vec<u32> = range.items.iter().map(|i| i.chapter).collect();
        assert_eq!(chapters, vec![2, 4]);
        assert_eq!(range.count, 2);

        let long = service.range("GEN", 1, 1).unwrap();
        assert_eq!(long.items[0].preview.chars().count(), 54);
        assert_eq!(long.items[0].verses, 3);

        assert!(matches!(
            service.range("GEN", 5, 9),
            Err(BibleError::EmptyRange { .. })
        ));
        assert!(matches!(
            service.range("GEN", 4, 2),
            Err(BibleError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_range_preview_truncates() {
        let (dir, service) = setup();
        let long = "x".repeat(200);
        write_chapter(dir.path(), "002_EXO_01.txt", &[long.as_str()]);
        let range = service.range("EXO", 1, 1).unwrap();
        assert_eq!(range.items[0].preview.chars().count(), 90);
    }

    #[test]
    fn test_random_verse_seeded_is_deterministic() {
        let (_dir, service) = setup();
        let filter = RandomFilter {
            seed: Some("genesis".to_string()),
            ..Default::default()
        };
        let a = service.random_verse(&filter).unwrap();
        let b = service.random_verse(&filter).unwrap();
        assert_eq!((a.file.as_str(), a.verse), (b.file.as_str(), b.verse));
        assert!(a.verse >= 1);
        assert_eq!(a.seed.as_deref(), Some("genesis"));
    }

    #[test]
    fn test_random_verse_respects_filters() {
        let (_dir, service) = setup();
        let filter = RandomFilter {
            book: Some("GEN".to_string()),
            chapter: Some(1),
            seed: None,
        };
        for _ in 0..10 {
            let pick = service.random_verse(&filter).unwrap();
            assert_eq!(pick.book, "GEN");
            assert_eq!(pick.chapter, 1);
            let expected = service.verse("GEN", 1, pick.verse as u32).unwrap();
            assert_eq!(pick.text, expected.text);
        }

        let none = RandomFilter {
            book: Some("XXX".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.random_verse(&none),
            Err(BibleError::NoCandidates)
        ));
    }

    #[test]
    fn test_random_verse_skips_empty_chapters() {
        let (dir, service) = setup();
        fs::write(dir.path().join("001_GEN_03.txt"), "Title line\nSubtitle line\n").unwrap();

        let filter = |seed: u64| RandomFilter {
            book: Some("GEN".to_string()),
            seed: Some(seed.to_string()),
            ..Default::default()
        };
        for seed in 0..50 {
            let pick = service.random_verse(&filter(seed)).unwrap();
            assert_ne!(pick.chapter, 3);
        }

        let only_empty = RandomFilter {
            book: Some("GEN".to_string()),
            chapter: Some(3),
            seed: None,
        };
        assert!(matches!(
            service.random_verse(&only_empty),
            Err(BibleError::NoCandidates)
        ));
    }

    #[test]
    fn test_search_keeps_surrounding_spaces() {
        let (_dir, service) = setup();
        let results = service
            .search(&SearchParams {
                q: " in ".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.items[0].book, "JHN");
        assert_eq!(results.items[0].verse, 2);
    }

    #[test]
    fn test_non_utf8_chapter_is_served() {
        let (dir, service) = setup();
        fs::write(
            dir.path().join("002_EXO_01.txt"),
            b"H1\nH2\nIn the beginning\nCaf\xe9 verse\n",
        )
        .unwrap();

        let chapter = service.chapter("EXO", 1).unwrap();
        assert_eq!(chapter.count, 2);
        assert_eq!(service.verse("EXO", 1, 2).unwrap().text, "Caf\u{FFFD} verse");
        assert_eq!(service.stats().verses, 9);
        let hits = service
            .search(&SearchParams {
                q: "beginning".to_string(),
                book: Some("EXO".to_string()),
                limit: None,
            })
            .unwrap();
        assert_eq!(hits.count, 1);
    }

    #[test]
    fn test_random_verse_missing_dir() {
        let service = QueryService::new(ChapterIndex::new("/nonexistent/bible"), Config::default());
        assert!(matches!(
            service.random_verse(&RandomFilter::default()),
            Err(BibleError::DirectoryMissing(_))
        ));
    }

    #[test]
    fn test_seed_to_u64() {
        assert_eq!(seed_to_u64("42"), 42);
        assert_eq!(seed_to_u64("abc"), seed_to_u64("abc"));
        assert_ne!(seed_to_u64("abc"), seed_to_u64("abd"));
    }

    #[test]
    fn test_files_lists_sizes() {
        let (_dir, service) = setup();
        let files = service.files().unwrap();
        assert_eq!(files.count, 4);
        assert_eq!(files.items[0].file, "001_GEN_01.txt");
    }
}
