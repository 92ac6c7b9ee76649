//! Parser for Doxygen's JavaScript search tables
//!
//! Doxygen writes its search data as JavaScript that a browser evaluates
//! directly. Only a tiny subset of the language ever appears, so this is a
//! small tokenizer plus a recursive-descent parser rather than a JS engine:
//!
//! ```text
//! var searchData=
//! [
//!   ['main',['main',['../vgg_8cc.html#a3c04...',1,'vgg.cc']]],
//!   ...
//! ];
//! ```
//!
//! and, for `searchdata.js`, a handful of `var name = { 0: "...", ... };`
//! object literals.

use std::iter::Peekable;
use std::str::Chars;

use smallvec::SmallVec;

use crate::error::ParseError;
use crate::model::{SearchEntry, SectionTables, SymbolLocation};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Equals,
    Str(String),
    Int(u64),
    Ident(String),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::Equals => "'='".to_string(),
            Token::Str(s) => format!("string '{}'", s),
            Token::Int(n) => format!("number {}", n),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Spanned, ParseError> {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '\u{feff}' {
                self.bump();
            } else {
                break;
            }
        }

        let (line, column) = (self.line, self.column);
        let spanned = |token| Spanned { token, line, column };

        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(spanned(Token::Eof)),
        };

        let token = match c {
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '=' => Token::Equals,
            '\'' | '"' => Token::Str(self.string_body(c, line, column)?),
            '0'..='9' => {
                let mut digits = String::from(c);
                while let Some(&d) = self.chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    self.bump();
                }
                let n = digits
                    .parse::<u64>()
                    .map_err(|_| self.error(line, column, format!("number {} out of range", digits)))?;
                Token::Int(n)
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let mut name = String::from(c);
                while let Some(&d) = self.chars.peek() {
                    if !(d.is_ascii_alphanumeric() || d == '_' || d == '$') {
                        break;
                    }
                    name.push(d);
                    self.bump();
                }
                Token::Ident(name)
            }
            other => {
                return Err(self.error(line, column, format!("unexpected character {:?}", other)));
            }
        };

        Ok(spanned(token))
    }

    fn string_body(&mut self, quote: char, line: usize, column: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(line, column, "unterminated string literal"));
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(escaped) => out.push(escaped),
                    None => {
                        return Err(self.error(line, column, "unterminated string literal"));
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }
}

#[derive(Debug)]
enum Value {
    Str(String),
    Int(u64),
    Array(Vec<Node>),
}

#[derive(Debug)]
struct Node {
    value: Value,
    line: usize,
    column: usize,
}

impl Node {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn into_str(self, what: &str) -> Result<String, ParseError> {
        match self.value {
            Value::Str(s) => Ok(s),
            _ => Err(self.error(format!("expected {} string", what))),
        }
    }

    fn into_array(self, what: &str) -> Result<(Vec<Node>, Node), ParseError> {
        // Keep a positioned husk around for follow-up errors
        let husk = Node {
            value: Value::Int(0),
            line: self.line,
            column: self.column,
        };
        match self.value {
            Value::Array(items) => Ok((items, husk)),
            _ => Err(husk.error(format!("expected {} array", what))),
        }
    }
}

/// Deepest array nesting accepted; entries need 4
const MAX_DEPTH: usize = 32;

struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Spanned,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let lookahead = lexer.next_token()?;
        Ok(Self {
            lexer,
            lookahead,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<Spanned, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError {
            line: self.lookahead.line,
            column: self.lookahead.column,
            message: format!("expected {}, found {}", expected, self.lookahead.token.describe()),
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), ParseError> {
        if self.lookahead.token == token {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(&token.describe()))
        }
    }

    fn eat(&mut self, token: Token) -> Result<bool, ParseError> {
        if self.lookahead.token == token {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.lookahead.token {
            Token::Ident(_) => match self.advance()?.token {
                Token::Ident(name) => Ok(name),
                _ => unreachable!("lookahead was an identifier"),
            },
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if matches!(&self.lookahead.token, Token::Ident(name) if name == keyword) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    /// `var <name> =`
    fn declaration(&mut self) -> Result<String, ParseError> {
        self.expect_keyword("var")?;
        let name = self.expect_ident()?;
        self.expect(Token::Equals)?;
        Ok(name)
    }

    fn value(&mut self) -> Result<Node, ParseError> {
        let (line, column) = (self.lookahead.line, self.lookahead.column);
        let value = match self.lookahead.token {
            Token::LBracket => {
                if self.depth >= MAX_DEPTH {
                    return Err(ParseError {
                        line,
                        column,
                        message: format!("arrays nested deeper than {} levels", MAX_DEPTH),
                    });
                }
                self.advance()?;
                self.depth += 1;
                let items = self.array_items()?;
                self.depth -= 1;
                Value::Array(items)
            }
            Token::Str(_) | Token::Int(_) => match self.advance()?.token {
                Token::Str(s) => Value::Str(s),
                Token::Int(n) => Value::Int(n),
                _ => unreachable!("lookahead was a literal"),
            },
            _ => return Err(self.unexpected("string, number or '['")),
        };
        Ok(Node { value, line, column })
    }

    /// Items after an opening `[`, consuming the closing `]`
    fn array_items(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(Token::RBracket)? {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(Token::Comma)? {
                self.expect(Token::RBracket)?;
                return Ok(items);
            }
        }
    }

    /// `{ 0: "abc", 1: "def" }`
    fn object(&mut self) -> Result<Vec<(u32, String)>, ParseError> {
        self.expect(Token::LBrace)?;
        let mut pairs = Vec::new();
        loop {
            if self.eat(Token::RBrace)? {
                return Ok(pairs);
            }

            let key = match self.lookahead.token {
                Token::Int(n) => u32::try_from(n).ok(),
                Token::Str(ref s) => s.parse::<u32>().ok(),
                _ => None,
            };
            let key = key.ok_or_else(|| self.unexpected("section index"))?;
            self.advance()?;
            self.expect(Token::Colon)?;

            let value = match self.lookahead.token {
                Token::Str(_) => match self.advance()?.token {
                    Token::Str(s) => s,
                    _ => unreachable!("lookahead was a string"),
                },
                _ => return Err(self.unexpected("string")),
            };
            pairs.push((key, value));

            if !self.eat(Token::Comma)? {
                self.expect(Token::RBrace)?;
                return Ok(pairs);
            }
        }
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.eat(Token::Semicolon)?;
        if self.lookahead.token == Token::Eof {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }
}

fn location_from_node(node: Node) -> Result<SymbolLocation, ParseError> {
    let (items, husk) = node.into_array("location")?;
    if items.len() != 3 {
        return Err(husk.error(format!(
            "location must be [url, flag, scope], found {} items",
            items.len()
        )));
    }

    let mut items = items.into_iter();
    let (url, flag, scope) = match (items.next(), items.next(), items.next()) {
        (Some(url), Some(flag), Some(scope)) => (url, flag, scope),
        _ => unreachable!("length checked above"),
    };

    let url = url.into_str("url")?;
    let local = match flag.value {
        Value::Int(n) => n != 0,
        _ => return Err(flag.error("expected numeric link flag")),
    };
    let scope = scope.into_str("scope")?;

    Ok(SymbolLocation { url, local, scope })
}

fn entry_from_node(node: Node) -> Result<SearchEntry, ParseError> {
    let (items, husk) = node.into_array("entry")?;
    if items.len() != 2 {
        return Err(husk.error(format!(
            "entry must be [key, [label, locations...]], found {} items",
            items.len()
        )));
    }

    let mut items = items.into_iter();
    let (key, body) = match (items.next(), items.next()) {
        (Some(key), Some(body)) => (key, body),
        _ => unreachable!("length checked above"),
    };

    let key = key.into_str("key")?;
    let (body, body_husk) = body.into_array("entry body")?;
    let mut body = body.into_iter();
    let label = body
        .next()
        .ok_or_else(|| body_husk.error("entry body is missing its label"))?
        .into_str("label")?;

    // Locations follow the label directly; an empty list is left for
    // index validation to report against the key.
    let locations = body
        .map(location_from_node)
        .collect::<Result<SmallVec<_>, _>>()?;

    Ok(SearchEntry { key, label, locations })
}

/// Parse a shard file (`var searchData=[...];`) into its entries, in file order
pub fn parse_search_data(text: &str) -> Result<Vec<SearchEntry>, ParseError> {
    let mut parser = Parser::new(text)?;

    let name = parser.declaration()?;
    if name != "searchData" {
        return Err(ParseError {
            line: 1,
            column: 1,
            message: format!("expected 'searchData' declaration, found '{}'", name),
        });
    }

    let root = parser.value()?;
    parser.finish()?;

    let (items, _) = root.into_array("searchData")?;
    items.into_iter().map(entry_from_node).collect()
}

/// Parse `searchdata.js` into its section tables
///
/// Declarations other than the three known tables are skipped.
pub fn parse_section_tables(text: &str) -> Result<SectionTables, ParseError> {
    let mut parser = Parser::new(text)?;
    let mut tables = SectionTables::default();

    while parser.lookahead.token != Token::Eof {
        let name = parser.declaration()?;
        let pairs = parser.object()?;
        parser.eat(Token::Semicolon)?;

        match name.as_str() {
            "indexSectionsWithContent" => tables.sections_with_content = pairs,
            "indexSectionNames" => tables.section_names = pairs,
            "indexSectionLabels" => tables.section_labels = pairs,
            other => tracing::debug!("Ignoring unknown searchdata table '{}'", other),
        }
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "var searchData=\n[\n  ['main',['main',['../vgg_8cc.html#a3c04',1,'vgg.cc']]],\n  ['make_5fdev',['make_dev',['../structVGG.html#a26e9',1,'VGG::make_dev()'],['../structvec.html#aa76a',1,'vec::make_dev()']]]\n];\n";

    #[test]
    fn test_parse_entries_in_order() {
        let entries = parse_search_data(SMALL).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].key, "main");
        assert_eq!(entries[0].label, "main");
        assert_eq!(entries[0].locations.len(), 1);
        assert_eq!(entries[0].locations[0].url, "../vgg_8cc.html#a3c04");
        assert!(entries[0].locations[0].local);
        assert_eq!(entries[0].locations[0].scope, "vgg.cc");

        assert_eq!(entries[1].key, "make_5fdev");
        assert_eq!(entries[1].locations.len(), 2);
        assert_eq!(entries[1].locations[1].scope, "vec::make_dev()");
    }

    #[test]
    fn test_parse_escapes_and_external_flag() {
        let text = r#"var searchData=[['it_27s',['it\'s',["ext.html",0,'a\\b']]]];"#;
        let entries = parse_search_data(text).unwrap();
        assert_eq!(entries[0].label, "it's");
        assert!(!entries[0].locations[0].local);
        assert_eq!(entries[0].locations[0].scope, "a\\b");
    }

    #[test]
    fn test_parse_empty_table() {
        assert!(parse_search_data("var searchData=\n[\n];\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_keeps_entry_without_locations() {
        let entries = parse_search_data("var searchData=[['x',['x']]];").unwrap();
        assert!(entries[0].locations.is_empty());
    }

    #[test]
    fn test_parse_error_positions() {
        let err = parse_search_data("var searchData=\n[\n  ['main',['main',['a.html',1]]]\n];").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 19);
        assert!(err.message.contains("[url, flag, scope]"), "{}", err.message);

        let err = parse_search_data("var searchData=\n[\n  ['main',['main',['a.html',1,'x']]]").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("end of input"), "{}", err.message);

        let err = parse_search_data("var searchData=[['unterminated]];").unwrap_err();
        assert!(err.message.contains("unterminated"), "{}", err.message);

        let err = parse_search_data("var other=[];").unwrap_err();
        assert!(err.message.contains("searchData"), "{}", err.message);
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let depth = 200_000;
        let text = format!("var searchData={}{};", "[".repeat(depth), "]".repeat(depth));
        let err = parse_search_data(&text).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 16 + MAX_DEPTH);
        assert!(err.message.contains("nested"), "{}", err.message);

        // Nesting up to the limit is still accepted syntax
        let text = format!("var searchData={}{};", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_search_data(&text).unwrap_err().message.contains("entry"));
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        let err = parse_search_data("var searchData=[]; var x=1;").unwrap_err();
        assert_eq!(err.column, 20);
    }

    #[test]
    fn test_parse_section_tables() {
        let text = "var indexSectionsWithContent =\n{\n  0: \"_abm~\",\n  1: \"bm\"\n};\n\nvar indexSectionNames =\n{\n  0: \"all\",\n  1: \"classes\"\n};\n\nvar indexSectionLabels =\n{\n  0: \"All\",\n  1: \"Classes\"\n};\n\n";
        let tables = parse_section_tables(text).unwrap();
        assert_eq!(tables.sections_with_content[0], (0, "_abm~".to_string()));
        assert_eq!(tables.section_names[1], (1, "classes".to_string()));
        assert_eq!(tables.label_of("all"), Some("All"));
        assert_eq!(tables.shard_id("classes", "MaxPooling2D").as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_section_tables_without_labels() {
        let text = "var indexSectionsWithContent = { 0: \"ab\" };\nvar indexSectionNames = { 0: \"all\" };";
        let tables = parse_section_tables(text).unwrap();
        assert!(tables.section_labels.is_empty());
        assert_eq!(tables.index_of("all"), Some(0));
    }
}
