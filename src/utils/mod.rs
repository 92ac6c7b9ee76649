//! Utility modules for search index handling
//!
//! - Search ids: Doxygen's key normalization and its inverse
//! - HTML: entity escaping of display labels

pub mod search_id;
pub mod html;

// Re-export commonly used functions
pub use search_id::{search_id, decode_search_id, normalize_query};
pub use html::{escape_label, unescape_label};
