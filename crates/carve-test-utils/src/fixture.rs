use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use carve_core::{TextRange, TextSize};
use carve_syntax::{NodeId, SyntaxKind, SyntaxTree, TreeBuilder};

/// A syntax tree parsed from an s-expression fixture, plus the offsets of
/// its `$N` markers.
///
/// Grammar:
///
/// ```text
/// item   := '(' Kind item* ')'      node
///         | "text"                  token, kind inferred from the text
///         | Kind ':' "text"         token with an explicit kind
///         | nl                      a newline token
///         | '$' digit               offset marker
/// ```
///
/// Consecutive tokens are separated by a single space unless a `nl` or an
/// explicit whitespace token sits between them, or punctuation such as `;`,
/// `.` and parentheses hugs its neighbour. A marker records the offset
/// right after the previously emitted text (before any pending separator), so
/// a marker at the end of a line still points at the end of the last token.
#[derive(Debug)]
pub struct Fixture {
    pub tree: SyntaxTree,
    markers: BTreeMap<u8, TextSize>,
}

impl Fixture {
    pub fn marker(&self, idx: u8) -> TextSize {
        *self
            .markers
            .get(&idx)
            .unwrap_or_else(|| panic!("fixture has no `${idx}` marker"))
    }

    /// Range between two markers.
    pub fn range(&self, start: u8, end: u8) -> TextRange {
        TextRange::new(self.marker(start), self.marker(end))
    }

    /// Range between `$0` and `$1`, the conventional selection.
    pub fn selection(&self) -> TextRange {
        self.range(0, 1)
    }

    /// Range of the first occurrence of `needle` in the fixture text.
    pub fn find(&self, needle: &str) -> TextRange {
        let start = self
            .tree
            .text()
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not found in fixture text"));
        TextRange::at(TextSize::from(start as u32), TextSize::of(needle))
    }

    /// Range of the `nth` (0-based) occurrence of `needle`.
    pub fn find_nth(&self, needle: &str, nth: usize) -> TextRange {
        let (start, _) = self
            .tree
            .text()
            .match_indices(needle)
            .nth(nth)
            .unwrap_or_else(|| panic!("occurrence {nth} of `{needle}` not found in fixture text"));
        TextRange::at(TextSize::from(start as u32), TextSize::of(needle))
    }

    /// First node of `kind` (preorder) whose trimmed text is `text`.
    pub fn node(&self, kind: SyntaxKind, text: &str) -> NodeId {
        let tree = &self.tree;
        tree.descendants(tree.root())
            .find(|&node| tree.kind(node) == kind && &tree.text()[tree.node_span(node)] == text)
            .unwrap_or_else(|| panic!("no {kind:?} node with text `{text}`"))
    }
}

/// Parses an s-expression fixture into a [`Fixture`]. Panics on malformed
/// input.
pub fn parse_fixture(src: &str) -> Fixture {
    let mut parser = FixtureParser {
        src: src.as_bytes(),
        pos: 0,
        builder: TreeBuilder::new(),
        offset: 0,
        pending_space: false,
        markers: BTreeMap::new(),
    };
    parser.skip_blank();
    parser.item();
    parser.skip_blank();
    assert!(
        parser.pos == parser.src.len(),
        "trailing input in fixture at byte {}",
        parser.pos
    );

    let tree = parser
        .builder
        .finish()
        .unwrap_or_else(|err| panic!("fixture does not form a tree: {err}"));
    Fixture {
        tree,
        markers: parser.markers,
    }
}

fn kinds_by_name() -> &'static HashMap<String, SyntaxKind> {
    static KINDS: OnceLock<HashMap<String, SyntaxKind>> = OnceLock::new();
    KINDS.get_or_init(|| {
        (0..u16::MAX)
            .map_while(SyntaxKind::from_raw)
            .map(|kind| (format!("{kind:?}"), kind))
            .collect()
    })
}

fn kind_named(name: &str) -> SyntaxKind {
    *kinds_by_name()
        .get(name)
        .unwrap_or_else(|| panic!("unknown syntax kind `{name}` in fixture"))
}

/// Punctuation written without a separator before it.
fn hugs_previous(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Semicolon
            | SyntaxKind::Comma
            | SyntaxKind::Dot
            | SyntaxKind::RParen
            | SyntaxKind::RBracket
    )
}

/// Punctuation written without a separator after it.
fn hugs_next(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Dot | SyntaxKind::LParen | SyntaxKind::LBracket
    )
}

struct FixtureParser<'a> {
    src: &'a [u8],
    pos: usize,
    builder: TreeBuilder,
    offset: u32,
    pending_space: bool,
    markers: BTreeMap<u8, TextSize>,
}

impl FixtureParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_blank(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b';' && self.src.get(self.pos + 1) == Some(&b';') {
                // `;;` comments run to the end of the fixture line.
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> &str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default()
    }

    fn string(&mut self) -> String {
        assert_eq!(self.peek(), Some(b'"'), "expected string at byte {}", self.pos);
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            let b = self
                .peek()
                .unwrap_or_else(|| panic!("unterminated string in fixture"));
            self.pos += 1;
            match b {
                b'"' => break,
                b'\\' => {
                    let escaped = self
                        .peek()
                        .unwrap_or_else(|| panic!("dangling escape in fixture"));
                    self.pos += 1;
                    out.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        other => other,
                    });
                }
                other => out.push(other),
            }
        }
        String::from_utf8(out).unwrap_or_else(|err| panic!("fixture string is not UTF-8: {err}"))
    }

    fn emit(&mut self, kind: SyntaxKind, text: &str) {
        self.builder.token(kind, text);
        self.offset += text.len() as u32;
    }

    fn flush_space(&mut self) {
        if self.pending_space {
            self.pending_space = false;
            self.emit(SyntaxKind::Whitespace, " ");
        }
    }

    fn token(&mut self, kind: SyntaxKind, text: &str) {
        if kind == SyntaxKind::Whitespace {
            self.pending_space = false;
            self.emit(kind, text);
            return;
        }
        if hugs_previous(kind) {
            self.pending_space = false;
        }
        self.flush_space();
        self.emit(kind, text);
        self.pending_space = !text.ends_with('\n') && !hugs_next(kind);
    }

    fn item(&mut self) {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                self.skip_blank();
                let kind = kind_named(&self.word().to_string());
                self.flush_space();
                self.builder.start_node(kind);
                loop {
                    self.skip_blank();
                    match self.peek() {
                        Some(b')') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => self.item(),
                        None => panic!("unclosed `({kind:?}` in fixture"),
                    }
                }
                self.builder.finish_node();
            }
            Some(b'"') => {
                let text = self.string();
                let kind = SyntaxKind::infer_token(&text);
                self.token(kind, &text);
            }
            Some(b'$') => {
                self.pos += 1;
                let digit = self
                    .peek()
                    .filter(u8::is_ascii_digit)
                    .unwrap_or_else(|| panic!("`$` must be followed by a digit in fixture"));
                self.pos += 1;
                let previous = self.markers.insert(digit - b'0', TextSize::from(self.offset));
                assert!(previous.is_none(), "duplicate marker `${}`", digit - b'0');
            }
            Some(b) if b.is_ascii_alphabetic() => {
                let word = self.word().to_string();
                if word == "nl" {
                    self.pending_space = false;
                    self.emit(SyntaxKind::Whitespace, "\n");
                } else {
                    assert_eq!(
                        self.peek(),
                        Some(b':'),
                        "bare word `{word}` in fixture; use `{word}:\"text\"` or a string"
                    );
                    self.pos += 1;
                    let text = self.string();
                    self.token(kind_named(&word), &text);
                }
            }
            other => panic!(
                "unexpected {:?} at byte {} in fixture",
                other.map(char::from),
                self.pos
            ),
        }
    }
}
