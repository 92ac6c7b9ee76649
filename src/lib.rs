//! Doxygen Search Index Reader
//!
//! Reads, validates, queries and re-writes the JavaScript search tables that
//! Doxygen emits next to its HTML output (`html/search/all_a.js` and friends).
//!
//! Layout:
//! - `utils/`: search id normalization and label entity escaping
//! - `model`: entries and their locations
//! - `parser` / `writer`: the `var searchData=[...];` format, byte-exact
//! - `search_index`: a single validated table with substring/prefix lookup
//! - `catalog`: a whole `search/` directory, shards loaded in parallel
//! - `api_server`: JSON HTTP surface (feature `api`)

pub mod utils;
pub mod error;
pub mod model;
pub mod parser;
pub mod writer;
pub mod search_index;
pub mod catalog;
pub mod config;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::{ConfigError, IndexError, ParseError};
pub use model::{SearchEntry, SymbolLocation, SectionTables};
pub use parser::{parse_search_data, parse_section_tables};
pub use writer::write_search_data;
pub use search_index::{SearchIndex, SearchIndexStats};
pub use catalog::{CatalogHit, SearchCatalog, SectionInfo};
pub use config::ServerConfig;
pub use utils::{search_id, decode_search_id, escape_label, unescape_label};

#[cfg(feature = "api")]
pub use api_server::{AppState, create_router};
