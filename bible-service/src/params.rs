//! String query parameters coerced into typed values.

use bible_core::BibleError;
use std::collections::HashMap;

pub struct Params(HashMap<String, String>);

impl Params {
    pub fn new(raw: HashMap<String, String>) -> Self {
        Self(raw)
    }

    /// Trimmed value; empty strings count as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value exactly as sent, surrounding whitespace included
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Book codes are case-insensitive on input and uppercase internally
    pub fn book(&self) -> Result<String, BibleError> {
        self.optional_book()
            .ok_or_else(|| BibleError::invalid("book is required"))
    }

    pub fn optional_book(&self) -> Option<String> {
        self.get("book").map(|b| b.to_ascii_uppercase())
    }

    pub fn positive(&self, name: &str) -> Result<u32, BibleError> {
        self.optional_positive(name)?
            .ok_or_else(|| BibleError::invalid(format!("{name} is required")))
    }

    pub fn optional_positive(&self, name: &str) -> Result<Option<u32>, BibleError> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err(BibleError::invalid(format!(
                    "{name} must be a positive integer"
                ))),
            },
        }
    }

    /// Invalid limits fall back to the configured default rather than failing
    pub fn lenient_usize(&self, name: &str) -> Option<usize> {
        self.get(name).and_then(|raw| raw.parse().ok())
    }
}
