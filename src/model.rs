//! Search entry data model
//!
//! One entry per distinct search id:
//!
//! ```text
//! ['make_5fdev',['make_dev',['../structVGG.html#a26e9...',1,'VGG::make_dev()'], ...]]
//!   key          label       url                           local scope
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::utils::html::unescape_label;

/// Most symbols are defined in exactly one place
pub type Locations = SmallVec<[SymbolLocation; 1]>;

/// One place a symbol is documented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLocation {
    /// Page path relative to the search directory, with optional `#anchor`
    pub url: String,
    /// Page belongs to this documentation set (vs. an external tag file)
    pub local: bool,
    /// Containing scope, XML-escaped; empty for compounds and files
    pub scope: String,
}

impl SymbolLocation {
    pub fn new(url: impl Into<String>, local: bool, scope: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local,
            scope: scope.into(),
        }
    }

    /// Page part of the url (before `#`)
    pub fn page(&self) -> &str {
        match self.url.split_once('#') {
            Some((page, _)) => page,
            None => &self.url,
        }
    }

    /// Anchor id, if the url points inside a page
    pub fn anchor(&self) -> Option<&str> {
        self.url.split_once('#').map(|(_, anchor)| anchor)
    }

    /// Scope with entities resolved
    pub fn display_scope(&self) -> String {
        unescape_label(&self.scope)
    }
}

/// A single row of a `searchData` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Normalized search id (see `utils::search_id`)
    pub key: String,
    /// Symbol name as written in source, XML-escaped
    pub label: String,
    pub locations: Locations,
}

impl SearchEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>, locations: Locations) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            locations,
        }
    }

    /// Label with entities resolved (`MaxPooling2D< maxB, ... >`)
    pub fn display_label(&self) -> String {
        unescape_label(&self.label)
    }
}

/// Contents of `searchdata.js`: which sections exist and which first
/// characters each one has a shard for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTables {
    /// Section index → characters with a shard, in shard order
    pub sections_with_content: Vec<(u32, String)>,
    /// Section index → file prefix (`all`, `classes`, ...)
    pub section_names: Vec<(u32, String)>,
    /// Section index → human label (`All`, `Classes`, ...)
    pub section_labels: Vec<(u32, String)>,
}

impl SectionTables {
    fn lookup(table: &[(u32, String)], index: u32) -> Option<&str> {
        table
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, v)| v.as_str())
    }

    /// Section index for a file prefix such as `functions`
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.section_names
            .iter()
            .find(|(_, n)| n == name)
            .map(|(i, _)| *i)
    }

    pub fn label_of(&self, name: &str) -> Option<&str> {
        Self::lookup(&self.section_labels, self.index_of(name)?)
    }

    /// Shard id (hex, as used in file names) holding entries whose symbol
    /// name starts with the first character of `query`
    pub fn shard_id(&self, name: &str, query: &str) -> Option<String> {
        let content = Self::lookup(&self.sections_with_content, self.index_of(name)?)?;
        let first = query.chars().next()?.to_lowercase().next()?;
        let position = content.chars().position(|c| c == first)?;
        Some(format!("{:x}", position))
    }
}
