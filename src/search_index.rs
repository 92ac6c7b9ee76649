//! Validated Search Index
//!
//! An immutable, in-memory view of one `searchData` table:
//! - exact key lookup through an FxHashMap
//! - substring search over keys (table order preserved)
//! - prefix search, which is what the browser widget does
//!
//! Queries are normalized with the same id rules as the keys, so
//! `make_d` matches `make_5fdev` and `MaxPooling2D<` matches
//! `maxpooling2d_3c_20maxb...`.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::IndexError;
use crate::model::{SearchEntry, SymbolLocation};
use crate::parser::parse_search_data;
use crate::utils::search_id::{normalize_query, search_id};
use crate::writer::write_search_data;

pub struct SearchIndex {
    /// Entries in table order
    entries: Vec<SearchEntry>,
    /// Key → position in `entries`
    by_key: FxHashMap<String, usize>,
}

impl SearchIndex {
    /// Build from parsed entries, enforcing the table invariants:
    /// non-empty keys, unique keys, at least one location per key
    pub fn from_entries(entries: Vec<SearchEntry>) -> Result<Self, IndexError> {
        let start = std::time::Instant::now();
        let mut by_key = FxHashMap::default();
        by_key.reserve(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            if entry.key.is_empty() {
                return Err(IndexError::EmptyKey { position });
            }
            if let Some(first) = by_key.insert(entry.key.clone(), position) {
                return Err(IndexError::DuplicateKey {
                    key: entry.key.clone(),
                    first,
                    second: position,
                });
            }
            if entry.locations.is_empty() {
                return Err(IndexError::NoLocations {
                    key: entry.key.clone(),
                });
            }
        }

        tracing::debug!(
            "Search index built in {:?} ({} entries)",
            start.elapsed(),
            entries.len()
        );

        Ok(Self { entries, by_key })
    }

    /// Parse shard text and validate it
    pub fn parse(text: &str) -> Result<Self, IndexError> {
        Self::from_entries(parse_search_data(text)?)
    }

    /// Read and validate a shard file
    pub fn load(path: &std::path::Path) -> Result<Self, IndexError> {
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SearchEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup by (already normalized) key
    pub fn get(&self, key: &str) -> Option<&SearchEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    /// All entries whose key contains the normalized query, in table order
    ///
    /// An empty query matches every entry.
    pub fn search(&self, query: &str) -> Vec<&SearchEntry> {
        let needle = normalize_query(query);
        self.entries
            .iter()
            .filter(|e| e.key.contains(needle.as_str()))
            .collect()
    }

    /// Entries whose key starts with the normalized query, in table order
    pub fn search_prefix(&self, query: &str, limit: usize) -> Vec<&SearchEntry> {
        let needle = normalize_query(query);
        self.entries
            .iter()
            .filter(|e| e.key.starts_with(needle.as_str()))
            .take(limit)
            .collect()
    }

    /// Typeahead search: prefix hits first, then the remaining substring hits
    pub fn lookup(&self, query: &str, limit: usize) -> Vec<&SearchEntry> {
        let needle = normalize_query(query);
        let (prefix, inner): (Vec<&SearchEntry>, Vec<&SearchEntry>) = self
            .entries
            .iter()
            .filter(|e| e.key.contains(needle.as_str()))
            .partition(|e| e.key.starts_with(needle.as_str()));

        prefix.into_iter().chain(inner).take(limit).collect()
    }

    /// Every location documented under a symbol name (entities resolved,
    /// case-sensitive)
    pub fn locations_of(&self, label: &str) -> Vec<&SymbolLocation> {
        let entry = self
            .get(&search_id(label))
            .filter(|e| e.display_label() == label)
            .or_else(|| self.entries.iter().find(|e| e.display_label() == label));

        entry
            .map(|e| e.locations.iter().collect())
            .unwrap_or_default()
    }

    /// Keys that don't equal the search id of their own label
    pub fn check_search_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.key != search_id(&e.display_label()))
            .map(|e| e.key.as_str())
            .collect()
    }

    /// Serialize back to Doxygen's shard format
    pub fn to_search_data(&self) -> String {
        write_search_data(&self.entries)
    }

    pub fn stats(&self) -> SearchIndexStats {
        let pages: FxHashSet<&str> = self
            .entries
            .iter()
            .flat_map(|e| e.locations.iter().map(SymbolLocation::page))
            .collect();

        SearchIndexStats {
            entry_count: self.entries.len(),
            location_count: self.entries.iter().map(|e| e.locations.len()).sum(),
            page_count: pages.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchIndexStats {
    pub entry_count: usize,
    pub location_count: usize,
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn entry(key: &str, label: &str, url: &str, scope: &str) -> SearchEntry {
        SearchEntry::new(key, label, smallvec![SymbolLocation::new(url, true, scope)])
    }

    fn sample() -> SearchIndex {
        SearchIndex::from_entries(vec![
            entry("main", "main", "../vgg_8cc.html#a3c0", "vgg.cc"),
            entry("max_5fi", "max_i", "../vgg__util_8h.html#ad74", "vgg_util.h"),
            entry("max_5fidx", "max_idx", "../structMaxPooling2D.html#ac6c", "MaxPooling2D"),
            entry("maxpooling_2eh", "maxpooling.h", "../maxpooling_8h.html", ""),
            entry("min_5fi", "min_i", "../vgg__util_8h.html#a6a0", "vgg_util.h"),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_key() {
        let result = SearchIndex::from_entries(vec![
            entry("main", "main", "a.html", ""),
            entry("m", "m", "b.html", ""),
            entry("main", "main", "c.html", ""),
        ]);
        match result {
            Err(IndexError::DuplicateKey { key, first, second }) => {
                assert_eq!(key, "main");
                assert_eq!((first, second), (0, 2));
            }
            other => panic!("expected DuplicateKey, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_rejects_empty_key_and_missing_locations() {
        assert!(matches!(
            SearchIndex::from_entries(vec![entry("", "x", "a.html", "")]),
            Err(IndexError::EmptyKey { position: 0 })
        ));

        let bare = SearchEntry::new("x", "x", smallvec![]);
        assert!(matches!(
            SearchIndex::from_entries(vec![bare]),
            Err(IndexError::NoLocations { .. })
        ));
    }

    #[test]
    fn test_search_substring_keeps_table_order() {
        let index = sample();
        let keys: Vec<&str> = index.search("_i").iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["max_5fi", "max_5fidx", "min_5fi"]);

        let keys: Vec<&str> = index.search("idx").iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["max_5fidx"]);

        assert_eq!(index.search("").len(), index.len());
        assert!(index.search("conv").is_empty());
    }

    #[test]
    fn test_search_prefix_and_limit() {
        let index = sample();
        let keys: Vec<&str> = index
            .search_prefix("MAX", 10)
            .iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(keys, vec!["max_5fi", "max_5fidx", "maxpooling_2eh"]);
        assert_eq!(index.search_prefix("max", 2).len(), 2);
        assert!(index.search_prefix("i", 10).is_empty());
    }

    #[test]
    fn test_lookup_ranks_prefix_first() {
        let index = sample();
        let keys: Vec<&str> = index.lookup("i", 10).iter().map(|e| e.key.as_str()).collect();
        // No key starts with 'i', so this is substring order
        assert_eq!(keys, vec!["main", "max_5fi", "max_5fidx", "maxpooling_2eh", "min_5fi"]);

        let keys: Vec<&str> = index.lookup("m", 2).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["main", "max_5fi"]);
    }

    #[test]
    fn test_get_and_locations_of() {
        let index = sample();
        assert_eq!(index.get("maxpooling_2eh").map(|e| e.label.as_str()), Some("maxpooling.h"));
        assert!(index.get("maxpooling.h").is_none());

        let locations = index.locations_of("max_idx");
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].scope, "MaxPooling2D");
        assert!(index.locations_of("MAX_IDX").is_empty());
    }

    #[test]
    fn test_stats_and_id_check() {
        let index = sample();
        let stats = index.stats();
        assert_eq!(stats.entry_count, 5);
        assert_eq!(stats.location_count, 5);
        // vgg__util_8h.html is shared by two entries
        assert_eq!(stats.page_count, 4);
        assert!(index.check_search_ids().is_empty());

        let suffixed = SearchIndex::from_entries(vec![entry("main_0", "main", "a.html", "")]).unwrap();
        assert_eq!(suffixed.check_search_ids(), vec!["main_0"]);
    }

    #[test]
    fn test_search_finds_entry_by_its_own_label() {
        let labels = ["Ärger", "Größe::Überlauf()", "make_dev", "MaxPooling2D< maxB >"];
        let entries = labels
            .iter()
            .map(|label| entry(&search_id(label), label, "a.html", ""))
            .collect();
        let index = SearchIndex::from_entries(entries).unwrap();

        for label in labels {
            let hits = index.search(label);
            assert!(
                hits.iter().any(|e| e.label == label),
                "{} not found by its own label",
                label
            );
        }
        assert_eq!(index.search_prefix("Ärg", 10).len(), 1);
    }
}
