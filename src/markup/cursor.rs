//! Cursor over markup text with the primitive scanning operations shared by
//! the tag-line parser and the literal evaluator.
//!
//! Positions are byte offsets into the source; every advance moves over whole
//! `char`s, so slices taken between two cursor positions are always valid.

use crate::error::ScanError;

/// Quote characters recognised by the markup grammar.
pub const QUOTES: &[char] = &['"', '\''];
/// Bracket openers, paired by index with [`CLOSERS`].
pub const OPENERS: &str = "([{";
/// Bracket closers, paired by index with [`OPENERS`].
pub const CLOSERS: &str = ")]}";
/// Escape character inside quoted strings.
pub const ESCAPE: char = '\\';

/// Join physical lines ending in a backslash into one logical line.
pub fn join_continuations(text: &str) -> String {
    text.replace("\\\r\n", "").replace("\\\n", "")
}

/// Strip the quotes of a scanned string literal and resolve its escapes.
/// Unknown escapes keep the backslash.
pub fn unquote(literal: &str) -> String {
    let mut chars = literal.chars();
    chars.next();
    chars.next_back();
    let mut out = String::with_capacity(literal.len());
    while let Some(c) = chars.next() {
        if c != ESCAPE {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(other) => {
                out.push(ESCAPE);
                out.push(other);
            }
            None => out.push(ESCAPE),
        }
    }
    out
}

/// A read position in a piece of markup text.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// A cursor starting at byte `pos`. Must be on a char boundary.
    pub fn at(text: &'a str, pos: usize) -> Self {
        debug_assert!(text.is_char_boundary(pos));
        Self { text, pos }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Consume and return one character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance over `n` characters (stopping at end of input).
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Consume `c` if it is next.
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skip spaces and return how many were skipped.
    pub fn skip_spaces(&mut self) -> usize {
        let mut count = 0;
        while self.peek() == Some(' ') {
            self.pos += 1;
            count += 1;
        }
        count
    }

    /// Consume characters while `pred` holds and return them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    /// Consume up to (not including) the next newline.
    pub fn rest_of_line(&mut self) -> &'a str {
        self.take_while(|c| c != '\n')
    }

    /// Scan a quoted string starting at the opening quote. Returns the full
    /// literal including both quotes.
    pub fn scan_quoted(&mut self, escape: char) -> Result<&'a str, ScanError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(ScanError::UnterminatedLiteral { start });
        };
        loop {
            match self.bump() {
                None => return Err(ScanError::UnterminatedLiteral { start }),
                Some(c) if c == escape => {
                    if self.bump().is_none() {
                        return Err(ScanError::UnterminatedLiteral { start });
                    }
                }
                Some(c) if c == quote => return Ok(&self.text[start..self.pos]),
                Some(_) => {}
            }
        }
    }

    /// Scan a value that may contain brackets and quoted strings, stopping at
    /// the first character accepted by `stop` while no bracket is open.
    ///
    /// `openers` and `closers` are paired by index. Depth is tracked per
    /// bracket kind: a closer whose kind has no open bracket is an
    /// [`ScanError::UnmatchedBracket`], and input ending with a bracket
    /// still open is an [`ScanError::UnterminatedLiteral`].
    pub fn scan_balanced(
        &mut self,
        openers: &str,
        closers: &str,
        quotes: &[char],
        escape: char,
        stop: impl Fn(char) -> bool,
    ) -> Result<&'a str, ScanError> {
        let start = self.pos;
        let mut depth = vec![0usize; openers.chars().count()];
        let mut first_open = None;

        while let Some(c) = self.peek() {
            let open = depth.iter().any(|&d| d > 0);
            if !open && stop(c) {
                break;
            }
            if quotes.contains(&c) {
                self.scan_quoted(escape)?;
                continue;
            }
            if let Some(kind) = openers.chars().position(|o| o == c) {
                if !open {
                    first_open = Some(self.pos);
                }
                depth[kind] += 1;
            } else if let Some(kind) = closers.chars().position(|o| o == c) {
                if depth[kind] == 0 {
                    return Err(ScanError::UnmatchedBracket {
                        found: c,
                        position: self.pos,
                    });
                }
                depth[kind] -= 1;
            }
            self.pos += c.len_utf8();
        }

        if depth.iter().any(|&d| d > 0) {
            return Err(ScanError::UnterminatedLiteral {
                start: first_open.unwrap_or(start),
            });
        }
        Ok(&self.text[start..self.pos])
    }

    /// 1-based line of the current position.
    pub fn line(&self) -> usize {
        self.text[..self.pos].matches('\n').count() + 1
    }

    /// 1-based column (in characters) of the current position.
    pub fn column(&self) -> usize {
        let line_start = self.text[..self.pos].rfind('\n').map_or(0, |i| i + 1);
        self.text[line_start..self.pos].chars().count() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> Result<&str, ScanError> {
        Cursor::new(input).scan_balanced(OPENERS, CLOSERS, QUOTES, ESCAPE, char::is_whitespace)
    }

    #[test]
    fn peek_advance_and_skip() {
        let mut c = Cursor::new("   abc");
        assert_eq!(c.skip_spaces(), 3);
        assert_eq!(c.peek(), Some('a'));
        c.advance(2);
        assert_eq!(c.rest(), "c");
        c.advance(10);
        assert!(c.is_eof());
    }

    #[test]
    fn balanced_value_stops_at_top_level_space() {
        assert_eq!(scan("{a + b} rest").unwrap(), "{a + b}");
        assert_eq!(scan("'close >' next").unwrap(), "'close >'");
        assert_eq!(scan("f(1, [2, 3]) x").unwrap(), "f(1, [2, 3])");
    }

    #[test]
    fn quoted_brackets_are_ignored() {
        assert_eq!(scan("{'}'} tail").unwrap(), "{'}'}");
    }

    #[test]
    fn escape_inside_string() {
        let mut c = Cursor::new(r"'it\'s' x");
        assert_eq!(c.scan_quoted(ESCAPE).unwrap(), r"'it\'s'");
    }

    #[test]
    fn unterminated_string_fails() {
        assert_eq!(
            scan("'abc"),
            Err(ScanError::UnterminatedLiteral { start: 0 })
        );
    }

    #[test]
    fn unexpected_closer_fails() {
        assert_eq!(
            scan("a)b"),
            Err(ScanError::UnmatchedBracket {
                found: ')',
                position: 1
            })
        );
    }

    #[test]
    fn unclosed_bracket_fails() {
        assert_eq!(
            scan("x{abc"),
            Err(ScanError::UnterminatedLiteral { start: 1 })
        );
    }

    #[test]
    fn bracket_kinds_are_counted_independently() {
        assert_eq!(scan("({)} z").unwrap(), "({)}");
    }

    #[test]
    fn unquote_resolves_escapes() {
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote(r#""a\tb\q""#), "a\tb\\q");
        assert_eq!(unquote("''"), "");
    }

    #[test]
    fn continuation_lines_are_joined() {
        assert_eq!(join_continuations("\\label a=1 \\\n  b=2"), "\\label a=1   b=2");
    }

    #[test]
    fn line_and_column() {
        let mut c = Cursor::new("ab\ncd");
        c.advance(4);
        assert_eq!((c.line(), c.column()), (2, 2));
    }
}
