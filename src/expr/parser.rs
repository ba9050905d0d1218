//! Recursive descent parser for bound expressions and setter statements.
//!
//! Precedence, loosest first:
//!
//! ```text
//! x if c else y
//! or
//! and
//! not
//! == != < <= > >= in, not in
//! + -
//! * / // %
//! unary - +
//! a.b  a[i]  a[i:j]  f(x)
//! ```

use super::ast::*;
use super::lexer::{tokenize, Spanned, Token};
use crate::markup::cursor::unquote;
use crate::value::{Decimal, Value};

/// Errors from expression parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at offset {offset}: {message}")]
    UnexpectedToken { offset: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("invalid character at offset {0}")]
    BadCharacter(usize),
    #[error("invalid number '{0}'")]
    BadNumber(String),
}

/// Parse a single expression. A top-level comma list yields a tuple.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse_expr_list()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Parse `;`-separated statements: assignments or bare expressions.
pub fn parse_statements(input: &str) -> Result<Vec<Stmt>, ParseError> {
    let mut parser = Parser::new(input)?;
    let mut stmts = Vec::new();
    while !parser.is_eof() {
        if parser.eat(&Token::Semicolon) {
            continue;
        }
        stmts.push(parser.parse_statement()?);
        if !parser.is_eof() {
            parser.expect(&Token::Semicolon)?;
        }
    }
    Ok(stmts)
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(input).map_err(ParseError::BadCharacter)?;
        Ok(Self { tokens, cursor: 0 })
    }

    fn is_eof(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|t| &t.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.cursor + n).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Spanned, ParseError> {
        match self.advance() {
            Some(tok) if &tok.token == expected => Ok(tok),
            Some(tok) => Err(ParseError::UnexpectedToken {
                offset: tok.offset,
                message: format!("expected {expected:?}, got '{}'", tok.text),
            }),
            None => Err(ParseError::UnexpectedEof(format!("expected {expected:?}"))),
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        match self.tokens.get(self.cursor) {
            None => Ok(()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                offset: tok.offset,
                message: format!("unexpected '{}'", tok.text),
            }),
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        match self.tokens.get(self.cursor) {
            Some(tok) => ParseError::UnexpectedToken {
                offset: tok.offset,
                message: format!("expected {what}, got '{}'", tok.text),
            },
            None => ParseError::UnexpectedEof(format!("expected {what}")),
        }
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    /// `target = expr` when the statement starts with a dotted name followed
    /// by `=`, otherwise an expression statement.
    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if let Some(len) = self.target_len() {
            if self.peek_nth(len) == Some(&Token::Assign) {
                let mut path = Vec::new();
                for _ in 0..len.div_ceil(2) {
                    if let Some(tok) = self.advance() {
                        path.push(tok.text);
                    }
                    self.eat(&Token::Dot);
                }
                self.expect(&Token::Assign)?;
                let value = self.parse_expr_list()?;
                return Ok(Stmt::Assign(Target(path), value));
            }
        }
        Ok(Stmt::Expr(self.parse_expr_list()?))
    }

    /// Token length of an `ident(.ident)*` run at the cursor.
    fn target_len(&self) -> Option<usize> {
        if self.peek() != Some(&Token::Ident) {
            return None;
        }
        let mut len = 1;
        while self.peek_nth(len) == Some(&Token::Dot) && self.peek_nth(len + 1) == Some(&Token::Ident) {
            len += 2;
        }
        Some(len)
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn parse_expr_list(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_expr()?;
        if self.peek() != Some(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at_expr_end() {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Token::ParenClose | Token::BracketClose | Token::Semicolon)
        )
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let then = self.parse_or()?;
        if self.eat(&Token::If) {
            let cond = self.parse_or()?;
            self.expect(&Token::Else)?;
            let otherwise = self.parse_expr()?;
            return Ok(Expr::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(then)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn comparison_op(&mut self) -> Option<BinaryOp> {
        let op = match self.peek()? {
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            Token::In => BinaryOp::In,
            Token::Not if self.peek_nth(1) == Some(&Token::In) => BinaryOp::NotIn,
            _ => return None,
        };
        self.cursor += if op == BinaryOp::NotIn { 2 } else { 1 };
        Some(op)
    }

    /// Chained comparisons `a < b < c` expand to `a < b and b < c`.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_sum()?;
        let mut result: Option<Expr> = None;
        while let Some(op) = self.comparison_op() {
            let right = self.parse_sum()?;
            let cmp = Expr::Binary(op, Box::new(left), Box::new(right.clone()));
            result = Some(match result {
                None => cmp,
                Some(prev) => Expr::And(Box::new(prev), Box::new(cmp)),
            });
            left = right;
        }
        Ok(result.unwrap_or(left))
    }

    fn parse_sum(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.cursor += 1;
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.cursor += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.parse_postfix(),
        };
        self.cursor += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.cursor += 1;
                    let name = self.expect(&Token::Ident)?;
                    expr = Expr::Attr(Box::new(expr), name.text);
                }
                Some(Token::ParenOpen) => {
                    self.cursor += 1;
                    let args = self.parse_sequence(&Token::ParenClose)?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                Some(Token::BracketOpen) => {
                    self.cursor += 1;
                    let sub = self.parse_subscript()?;
                    self.expect(&Token::BracketClose)?;
                    expr = Expr::Index(Box::new(expr), Box::new(sub));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_subscript(&mut self) -> Result<Subscript, ParseError> {
        let bound = |p: &mut Self| -> Result<Option<Expr>, ParseError> {
            if matches!(p.peek(), Some(Token::Colon | Token::BracketClose)) {
                Ok(None)
            } else {
                p.parse_expr().map(Some)
            }
        };

        let start = bound(self)?;
        if !self.eat(&Token::Colon) {
            return match start {
                Some(index) => Ok(Subscript::Index(index)),
                None => Err(self.unexpected("an index")),
            };
        }
        let stop = bound(self)?;
        let step = if self.eat(&Token::Colon) { bound(self)? } else { None };
        Ok(Subscript::Slice { start, stop, step })
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn parse_sequence(&mut self, close: &Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let Some(tok) = self.advance() else {
            return Err(ParseError::UnexpectedEof("expected an expression".into()));
        };
        let expr = match tok.token {
            Token::Int => {
                let n = tok
                    .text
                    .parse::<i64>()
                    .map_err(|_| ParseError::BadNumber(tok.text.clone()))?;
                Expr::Literal(Value::Int(n))
            }
            Token::Decimal => {
                let d = tok
                    .text
                    .parse::<Decimal>()
                    .map_err(|_| ParseError::BadNumber(tok.text.clone()))?;
                Expr::Literal(Value::Decimal(d))
            }
            Token::Str => Expr::Literal(Value::Str(unquote(&tok.text))),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::None => Expr::Literal(Value::None),
            Token::Ident => Expr::Name(tok.text),
            Token::ParenOpen => {
                if self.eat(&Token::ParenClose) {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.parse_expr_list()?;
                self.expect(&Token::ParenClose)?;
                inner
            }
            Token::BracketOpen => Expr::List(self.parse_sequence(&Token::BracketClose)?),
            _ => {
                return Err(ParseError::UnexpectedToken {
                    offset: tok.offset,
                    message: format!("expected an expression, got '{}'", tok.text),
                })
            }
        };
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.into()))
    }

    fn int(i: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Int(i)))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_expr("a + b * 2").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                name("a"),
                Box::new(Expr::Binary(BinaryOp::Mul, name("b"), int(2)))
            )
        );
    }

    #[test]
    fn test_not_in() {
        assert_eq!(
            parse_expr("x not in xs").unwrap(),
            Expr::Binary(BinaryOp::NotIn, name("x"), name("xs"))
        );
    }

    #[test]
    fn test_conditional_expression() {
        let expr = parse_expr("'on' if flag else 'off'").unwrap();
        assert!(matches!(expr, Expr::Conditional { .. }));
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(
            parse_expr("store.items[1:]").unwrap(),
            Expr::Index(
                Box::new(Expr::Attr(name("store"), "items".into())),
                Box::new(Subscript::Slice {
                    start: Some(Expr::Literal(Value::Int(1))),
                    stop: None,
                    step: None
                })
            )
        );
        assert!(matches!(parse_expr("f(1, 2,)").unwrap(), Expr::Call(_, args) if args.len() == 2));
    }

    #[test]
    fn test_tuples() {
        assert_eq!(parse_expr("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(parse_expr("(1,)").unwrap(), Expr::Tuple(vec![*int(1)]));
        assert_eq!(parse_expr("1, 2").unwrap(), Expr::Tuple(vec![*int(1), *int(2)]));
        assert_eq!(parse_expr("(1)").unwrap(), *int(1));
    }

    #[test]
    fn test_chained_comparison() {
        assert!(matches!(parse_expr("0 <= i < n").unwrap(), Expr::And(_, _)));
    }

    #[test]
    fn test_statements() {
        let stmts = parse_statements("count = count + 1; todo.done = not todo.done; save()").unwrap();
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], Stmt::Assign(t, _) if t.path() == "count"));
        assert!(matches!(&stmts[1], Stmt::Assign(t, _) if t.path() == "todo.done"));
        assert!(matches!(&stmts[2], Stmt::Expr(Expr::Call(_, _))));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_expr("a +"), Err(ParseError::UnexpectedEof(_))));
        assert!(matches!(
            parse_expr("a b"),
            Err(ParseError::UnexpectedToken { offset: 2, .. })
        ));
        assert_eq!(parse_expr("a $ b"), Err(ParseError::BadCharacter(2)));
        assert!(parse_expr("x[]").is_err());
    }
}
