//! Search Catalog - a whole Doxygen `html/search/` directory
//!
//! Doxygen splits its search data by section (`all`, `classes`,
//! `functions`, ...) and by first character of the symbol name:
//!
//! ```text
//! search/
//! ├── searchdata.js   # section names + which characters have a shard
//! ├── all_0.js        # section "all", shard 0
//! ├── all_a.js        # section "all", shard 10
//! └── classes_1.js
//! ```
//!
//! Every shard is parsed and validated on load (in parallel with rayon).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::IndexError;
use crate::model::{SearchEntry, SectionTables};
use crate::parser::parse_section_tables;
use crate::search_index::SearchIndex;

/// Section searched when the caller doesn't name one
pub const DEFAULT_SECTION: &str = "all";

const SECTION_TABLES_FILE: &str = "searchdata.js";

/// One `<section>_<hex>.js` file
pub struct Shard {
    pub id: u32,
    pub file_name: String,
    pub index: SearchIndex,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionInfo {
    pub name: String,
    pub label: Option<String>,
    pub shard_count: usize,
    pub entry_count: usize,
}

/// A search result tagged with where it came from
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogHit<'a> {
    pub section: &'a str,
    pub shard: u32,
    pub entry: &'a SearchEntry,
}

pub struct SearchCatalog {
    tables: Option<SectionTables>,
    /// Section name → shards ordered by id
    sections: BTreeMap<String, Vec<Shard>>,
}

/// Split `all_1a.js` into (`all`, 0x1a)
fn parse_shard_name(file_name: &str) -> Option<(&str, u32)> {
    let stem = file_name.strip_suffix(".js")?;
    let (section, id) = stem.rsplit_once('_')?;
    if section.is_empty() || !section.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let id = u32::from_str_radix(id, 16).ok()?;
    Some((section, id))
}

fn read_file(path: &Path) -> Result<String, IndexError> {
    std::fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn in_file(path: &Path, err: IndexError) -> IndexError {
    IndexError::Shard {
        path: path.to_path_buf(),
        source: Box::new(err),
    }
}

impl SearchCatalog {
    /// Load every shard of a search directory
    ///
    /// Files that aren't shards are ignored; a shard that fails to parse or
    /// validate fails the whole load.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let start = std::time::Instant::now();
        tracing::info!("Loading search catalog from {:?}...", dir);

        let read_dir = std::fs::read_dir(dir).map_err(|source| IndexError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut candidates: Vec<(String, u32, PathBuf)> = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| IndexError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some((section, id)) = parse_shard_name(file_name) {
                candidates.push((section.to_string(), id, dir_entry.path()));
            }
        }

        let tables_path = dir.join(SECTION_TABLES_FILE);
        let tables = if tables_path.is_file() {
            let text = read_file(&tables_path)?;
            Some(parse_section_tables(&text).map_err(|e| in_file(&tables_path, e.into()))?)
        } else {
            tracing::warn!("No {} in {:?}; shard routing disabled", SECTION_TABLES_FILE, dir);
            None
        };

        let shards: Vec<(String, Shard)> = candidates
            .into_par_iter()
            .map(|(section, id, path)| {
                let text = read_file(&path)?;
                let index = SearchIndex::parse(&text).map_err(|e| in_file(&path, e))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok((section, Shard { id, file_name, index }))
            })
            .collect::<Result<_, IndexError>>()?;

        let catalog = Self::from_shards(tables, shards);

        tracing::info!(
            "Search catalog loaded in {:?} ({} sections, {} shards, {} entries)",
            start.elapsed(),
            catalog.sections.len(),
            catalog.shard_count(),
            catalog.entry_count()
        );

        Ok(catalog)
    }

    /// Assemble a catalog from already-built shards
    pub fn from_shards(tables: Option<SectionTables>, shards: Vec<(String, Shard)>) -> Self {
        let mut sections: BTreeMap<String, Vec<Shard>> = BTreeMap::new();
        for (section, shard) in shards {
            sections.entry(section).or_default().push(shard);
        }
        for shards in sections.values_mut() {
            shards.sort_by_key(|s| s.id);
        }
        Self { tables, sections }
    }

    pub fn tables(&self) -> Option<&SectionTables> {
        self.tables.as_ref()
    }

    pub fn shards(&self, section: &str) -> &[Shard] {
        self.sections.get(section).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn shard_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn entry_count(&self) -> usize {
        self.sections
            .values()
            .flatten()
            .map(|s| s.index.len())
            .sum()
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        self.sections
            .iter()
            .map(|(name, shards)| SectionInfo {
                name: name.clone(),
                label: self
                    .tables
                    .as_ref()
                    .and_then(|t| t.label_of(name))
                    .map(str::to_string),
                shard_count: shards.len(),
                entry_count: shards.iter().map(|s| s.index.len()).sum(),
            })
            .collect()
    }

    /// The shard the browser widget would open for `query`
    ///
    /// Needs `searchdata.js`; returns `None` without it.
    pub fn shard_for(&self, section: &str, query: &str) -> Option<&Shard> {
        let id = self.tables.as_ref()?.shard_id(section, query)?;
        let id = u32::from_str_radix(&id, 16).ok()?;
        self.shards(section).iter().find(|s| s.id == id)
    }

    fn section_key<'a>(&'a self, section: Option<&str>) -> Option<(&'a str, &'a [Shard])> {
        let name = section.unwrap_or(DEFAULT_SECTION);
        self.sections
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Substring search across every shard of a section, shard order then
    /// table order
    pub fn search(&self, section: Option<&str>, query: &str, limit: usize) -> Vec<CatalogHit<'_>> {
        let Some((name, shards)) = self.section_key(section) else {
            return Vec::new();
        };

        shards
            .iter()
            .flat_map(|shard| {
                shard.index.search(query).into_iter().map(move |entry| CatalogHit {
                    section: name,
                    shard: shard.id,
                    entry,
                })
            })
            .take(limit)
            .collect()
    }

    /// Prefix search; opens only the routed shard when section tables exist
    pub fn search_prefix(&self, section: Option<&str>, query: &str, limit: usize) -> Vec<CatalogHit<'_>> {
        let Some((name, shards)) = self.section_key(section) else {
            return Vec::new();
        };

        let routed: Vec<&Shard> = match self.shard_for(name, query) {
            Some(shard) if !query.is_empty() => vec![shard],
            _ => shards.iter().collect(),
        };

        routed
            .into_iter()
            .flat_map(|shard| {
                shard
                    .index
                    .search_prefix(query, limit)
                    .into_iter()
                    .map(move |entry| CatalogHit {
                        section: name,
                        shard: shard.id,
                        entry,
                    })
            })
            .take(limit)
            .collect()
    }

    /// Exact key lookup within a section
    pub fn get(&self, section: Option<&str>, key: &str) -> Option<CatalogHit<'_>> {
        let (name, shards) = self.section_key(section)?;
        shards.iter().find_map(|shard| {
            shard.index.get(key).map(|entry| CatalogHit {
                section: name,
                shard: shard.id,
                entry,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shard_name() {
        assert_eq!(parse_shard_name("all_a.js"), Some(("all", 10)));
        assert_eq!(parse_shard_name("all_1a.js"), Some(("all", 26)));
        assert_eq!(parse_shard_name("enumvalues_0.js"), Some(("enumvalues", 0)));
        assert_eq!(parse_shard_name("searchdata.js"), None);
        assert_eq!(parse_shard_name("search.js"), None);
        assert_eq!(parse_shard_name("all_a.html"), None);
        assert_eq!(parse_shard_name("all_.js"), None);
        assert_eq!(parse_shard_name("_1.js"), None);
        assert_eq!(parse_shard_name("All_1.js"), None);
    }

    fn shard(id: u32, text: &str) -> Shard {
        Shard {
            id,
            file_name: format!("all_{:x}.js", id),
            index: SearchIndex::parse(text).unwrap(),
        }
    }

    #[test]
    fn test_search_spans_shards_in_id_order() {
        let catalog = SearchCatalog::from_shards(
            None,
            vec![
                (
                    "all".to_string(),
                    shard(2, "var searchData=[['vgg',['VGG',['../structVGG.html',1,'']]]];"),
                ),
                (
                    "all".to_string(),
                    shard(1, "var searchData=[['block',['Block',['../structBlock.html',1,'']]]];"),
                ),
            ],
        );

        let hits = catalog.search(None, "", 10);
        let keys: Vec<&str> = hits.iter().map(|h| h.entry.key.as_str()).collect();
        assert_eq!(keys, vec!["block", "vgg"]);
        assert_eq!(hits[0].shard, 1);
        assert_eq!(hits[0].section, "all");

        assert_eq!(catalog.search(None, "", 1).len(), 1);
        assert!(catalog.search(Some("classes"), "vgg", 10).is_empty());
        assert_eq!(catalog.get(None, "vgg").map(|h| h.shard), Some(2));
        assert_eq!(catalog.entry_count(), 2);
    }
}
