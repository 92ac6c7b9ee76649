//! Search Id Normalization
//!
//! Doxygen keys every search entry by an id derived from the symbol name:
//! letters are lower-cased (Unicode-aware), `a-z`/`0-9` and non-ASCII
//! characters are kept, and every other byte becomes `_` plus two lower-case
//! hex digits.
//!
//! Examples:
//! - `make_dev` → `make_5fdev`
//! - `maxpooling.h` → `maxpooling_2eh`
//! - `MaxPooling2D< maxB >` → `maxpooling2d_3c_20maxb_20_3e`

use std::fmt::Write as _;

use crate::error::IndexError;

/// Compute the Doxygen search id for a (not XML-escaped) symbol name
pub fn search_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    for c in name.chars().flat_map(char::to_lowercase) {
        push_id_char(&mut out, c);
    }
    out
}

/// Normalize user input the way the browser widget does before matching keys
///
/// Queries go through the same transformation as names, so a symbol is
/// always found by its own name.
pub fn normalize_query(query: &str) -> String {
    search_id(query)
}

fn push_id_char(out: &mut String, c: char) {
    if c.is_ascii_lowercase() || c.is_ascii_digit() || !c.is_ascii() {
        out.push(c);
    } else {
        // ASCII, so a single byte
        let _ = write!(out, "_{:02x}", c as u32);
    }
}

/// Reverse a search id back to the lower-cased symbol name
///
/// Fails on a `_` that is not followed by two hex digits encoding an ASCII byte.
pub fn decode_search_id(id: &str) -> Result<String, IndexError> {
    let bytes = id.as_bytes();
    let mut out = String::with_capacity(id.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'_' {
            let decoded = id
                .get(i + 1..i + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(u8::is_ascii);

            match decoded {
                Some(b) => {
                    out.push(b as char);
                    i += 3;
                }
                None => {
                    return Err(IndexError::InvalidSearchId {
                        id: id.to_string(),
                        offset: i,
                    });
                }
            }
        } else {
            // Copy one whole UTF-8 character
            let ch = id[i..].chars().next().unwrap_or_default();
            out.push(ch);
            i += ch.len_utf8().max(1);
        }
    }

    Ok(out)
}
