//! Column catalog: the list of column names a caller can pick from, loaded
//! fresh per request from a `;`-separated text file, plus the pure filtering
//! used to narrow it down by prefix and accent-insensitive search text.

use crate::error::{ExtractError, Result};
use std::fs;
use std::path::Path;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase with diacritics removed (NFD, combining marks dropped), so
/// `"Ação"` and `"acao"` compare equal.
pub fn normalize_label(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

/// Whether `item` is shown under the current `prefix` and `search` text.
///
/// `prefix` is an exact, case-sensitive `starts_with`; `search` is a substring
/// match after [`normalize_label`] on both sides. Empty search matches all.
pub fn visible(item: &str, prefix: Option<&str>, search: &str) -> bool {
    if let Some(p) = prefix {
        if !item.starts_with(p) {
            return false;
        }
    }
    let needle = normalize_label(search.trim());
    needle.is_empty() || normalize_label(item).contains(&needle)
}

fn split_names(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Immutable, sorted, duplicate-free list of column names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnCatalog {
    items: Vec<String>,
}

impl ColumnCatalog {
    pub fn parse(text: &str) -> Self {
        let mut items: Vec<String> = split_names(text).map(str::to_string).collect();
        items.sort();
        items.dedup();
        Self { items }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ExtractError::Io { path: path.to_path_buf(), source: e })?;
        Ok(Self::parse(&text))
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Catalog entries named in `text` (`;`-separated), matched accent- and
    /// case-insensitively, returned in catalog order.
    pub fn select_from_text(&self, text: &str) -> Vec<String> {
        let wanted: Vec<String> = split_names(text).map(normalize_label).collect();
        self.items
            .iter()
            .filter(|item| wanted.contains(&normalize_label(item)))
            .cloned()
            .collect()
    }
}

/// Explicit filter state over a catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub prefix: Option<String>,
    pub search: String,
}

impl CatalogFilter {
    /// Selecting a prefix clears the search text.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()), search: String::new() }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn visible_items<'a>(&self, catalog: &'a ColumnCatalog) -> Vec<&'a str> {
        catalog
            .items()
            .iter()
            .map(String::as_str)
            .filter(|item| visible(item, self.prefix.as_deref(), &self.search))
            .collect()
    }
}
