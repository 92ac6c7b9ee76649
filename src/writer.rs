//! Serializer for `searchData` shard files
//!
//! Reproduces Doxygen's layout byte for byte, so a parsed shard can be
//! written back unchanged.

use std::fmt::Write as _;

use crate::model::{SearchEntry, SymbolLocation};

fn push_js_string(out: &mut String, value: &str) {
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
}

fn push_location(out: &mut String, location: &SymbolLocation) {
    out.push('[');
    push_js_string(out, &location.url);
    let _ = write!(out, ",{},", u8::from(location.local));
    push_js_string(out, &location.scope);
    out.push(']');
}

/// Render one entry as `['key',['label',[loc],[loc]]]`
pub fn write_entry(out: &mut String, entry: &SearchEntry) {
    out.push('[');
    push_js_string(out, &entry.key);
    out.push_str(",[");
    push_js_string(out, &entry.label);
    for location in &entry.locations {
        out.push(',');
        push_location(out, location);
    }
    out.push_str("]]");
}

/// Render a complete shard file
pub fn write_search_data(entries: &[SearchEntry]) -> String {
    let mut out = String::from("var searchData=\n[\n");
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str("  ");
        write_entry(&mut out, entry);
    }
    out.push_str("\n];\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_search_data;
    use smallvec::smallvec;

    #[test]
    fn test_write_single_entry() {
        let entries = vec![SearchEntry::new(
            "max_5fi",
            "max_i",
            smallvec![SymbolLocation::new("../vgg__util_8h.html#ad744", true, "vgg_util.h")],
        )];
        assert_eq!(
            write_search_data(&entries),
            "var searchData=\n[\n  ['max_5fi',['max_i',['../vgg__util_8h.html#ad744',1,'vgg_util.h']]]\n];\n"
        );
    }

    #[test]
    fn test_write_multi_location_and_external() {
        let entry = SearchEntry::new(
            "make_5fdev",
            "make_dev",
            smallvec![
                SymbolLocation::new("../structVGG.html#a26e9", true, "VGG::make_dev()"),
                SymbolLocation::new("https://ext/x.html", false, "ext::make_dev()"),
            ],
        );
        let mut out = String::new();
        write_entry(&mut out, &entry);
        assert_eq!(
            out,
            "['make_5fdev',['make_dev',['../structVGG.html#a26e9',1,'VGG::make_dev()'],['https://ext/x.html',0,'ext::make_dev()']]]"
        );
    }

    #[test]
    fn test_write_escapes_quotes() {
        let entries = vec![SearchEntry::new(
            "it_27s",
            "it's",
            smallvec![SymbolLocation::new("a.html", true, "c:\\dir")],
        )];
        let text = write_search_data(&entries);
        assert!(text.contains(r"'it\'s'"));
        assert_eq!(parse_search_data(&text).unwrap(), entries);
    }

    #[test]
    fn test_write_empty_table() {
        assert_eq!(write_search_data(&[]), "var searchData=\n[\n\n];\n");
    }
}
