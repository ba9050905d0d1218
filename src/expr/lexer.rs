//! logos-based tokenizer for bound expressions.
//!
//! Keywords are declared with `#[token]` so they win over [`Token::Ident`]
//! on equal-length matches; `//`, `==`, `<=` and friends are longer than
//! their one-character prefixes and win by length.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // ── Keywords ─────────────────────────────────────────────────────
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("in")]
    In,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    // ── Literals ─────────────────────────────────────────────────────
    /// Decimal number: `3.14`, `0.5`.
    #[regex(r"[0-9]+\.[0-9]+")]
    Decimal,

    #[regex(r"[0-9]+")]
    Int,

    /// Quoted string with backslash escapes, either quote style.
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    Str,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ── Operators ────────────────────────────────────────────────────
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("//")]
    SlashSlash,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,

    // ── Punctuation ──────────────────────────────────────────────────
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
}

/// A token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub offset: usize,
}

/// Tokenize `input`. Fails with the byte offset of the first character
/// that does not start any token.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, usize> {
    let mut out = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        match result {
            Ok(token) => out.push(Spanned {
                token,
                text: input[span.clone()].to_owned(),
                offset: span.start,
            }),
            Err(()) => return Err(span.start),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(
            tokens("not in and or notice inner"),
            vec![
                Token::Not,
                Token::In,
                Token::And,
                Token::Or,
                Token::Ident,
                Token::Ident
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("1 2.5 10"), vec![Token::Int, Token::Decimal, Token::Int]);
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            tokens("a // b == c != d <= e"),
            vec![
                Token::Ident,
                Token::SlashSlash,
                Token::Ident,
                Token::EqEq,
                Token::Ident,
                Token::NotEq,
                Token::Ident,
                Token::LtEq,
                Token::Ident
            ]
        );
    }

    #[test]
    fn test_strings_keep_quotes() {
        let toks = tokenize(r#"'it\'s' "x""#).unwrap();
        assert_eq!(toks[0].text, r"'it\'s'");
        assert_eq!(toks[1].token, Token::Str);
        assert_eq!(toks[1].offset, 8);
    }

    #[test]
    fn test_error_offset() {
        assert_eq!(tokenize("a + $b"), Err(4));
    }
}
