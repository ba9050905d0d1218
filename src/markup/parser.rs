//! Indentation-based markup parser.
//!
//! Parses markup text into an [`Instruction`] tree. One instruction per
//! significant line; nesting comes from indentation measured in a unit
//! inferred from the first indented line.
//!
//! ```text
//! \frame pos:grid=0,0
//!   \label:title text={name}
//!   !if logged_in
//!     \button text='logout' command={logout}
//!   !enum todos:(idx, todo)
//!     \label text={todo}
//! ```

use std::rc::Rc;

use super::cursor::{join_continuations, Cursor, CLOSERS, ESCAPE, OPENERS, QUOTES};
use super::instruction::{
    ConditionalInstruction, Instruction, InstructionKind, RawLiteral, RepeatInstruction,
    TagInstruction,
};
use crate::error::{ScanError, SyntaxError, SyntaxErrorKind};

/// Literal used for a bare attribute key (`\checkbutton checked`).
pub const BARE_ATTRIBUTE_VALUE: &str = "True";

fn is_component_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_attr_char(c: char) -> bool {
    is_var_char(c) || c == ':'
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_') && chars.all(is_var_char)
}

/// A significant source line: not blank, not a comment.
struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

/// Parse markup into its root instruction.
pub fn parse(text: &str) -> Result<Instruction, SyntaxError> {
    let joined = join_continuations(text);
    let lines = significant_lines(&joined)?;
    // Indentation is measured from the least indented line.
    let offset = lines.iter().map(|l| l.indent).min().unwrap_or(0);

    let mut lines = lines.into_iter();
    let Some(first) = lines.next() else {
        return Err(SyntaxError::new(SyntaxErrorKind::EmptyTemplate, 1, 1));
    };
    let root = parse_line(&first)?;
    if !matches!(root.kind, InstructionKind::Tag(_)) {
        return Err(SyntaxError::new(
            SyntaxErrorKind::ExpectedTag,
            first.number,
            first.indent + 1,
        ));
    }
    let root_indent = first.indent - offset;

    // Open blocks, innermost last. The root sits at level 0.
    let mut stack: Vec<(usize, Instruction)> = vec![(0, root)];
    let mut unit: Option<usize> = None;

    for line in lines {
        let indent = line.indent - offset;
        if indent <= root_indent {
            // A dedent to the root's column ends the root block.
            log::debug!("root block ends at line {}; rest ignored", line.number);
            break;
        }
        let relative = indent - root_indent;
        let unit = *unit.get_or_insert(relative);
        if relative % unit != 0 {
            return Err(SyntaxError::new(
                SyntaxErrorKind::BadIndent { unit },
                line.number,
                line.indent + 1,
            ));
        }
        let level = relative / unit;

        close_blocks(&mut stack, level);
        let parent_level = stack.last().map_or(0, |(l, _)| *l);
        if parent_level + 1 != level {
            return Err(SyntaxError::new(
                SyntaxErrorKind::Overindented,
                line.number,
                line.indent + 1,
            ));
        }
        stack.push((level, parse_line(&line)?));
    }

    close_blocks(&mut stack, 1);
    let (_, root) = stack.pop().ok_or_else(|| {
        SyntaxError::new(SyntaxErrorKind::EmptyTemplate, 1, 1)
    })?;
    Ok(root)
}

/// Pop every open block at `level` or deeper, attaching each to its parent.
fn close_blocks(stack: &mut Vec<(usize, Instruction)>, level: usize) {
    while stack.len() > 1 && stack.last().is_some_and(|(l, _)| *l >= level) {
        if let Some((_, done)) = stack.pop() {
            if let Some((_, parent)) = stack.last_mut() {
                parent.children.push(Rc::new(done));
            }
        }
    }
}

/// Collect non-blank, non-comment lines with their indentation.
fn significant_lines(text: &str) -> Result<Vec<Line<'_>>, SyntaxError> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let line = raw.trim_end_matches('\r');
        let body = line.trim_start_matches([' ', '\t']);
        if body.is_empty() || body.starts_with('#') {
            continue;
        }
        let leading = &line[..line.len() - body.len()];
        if let Some(tab) = leading.find('\t') {
            return Err(SyntaxError::new(SyntaxErrorKind::TabIndent, number, tab + 1));
        }
        out.push(Line {
            number,
            indent: leading.len(),
            text: line,
        });
    }
    Ok(out)
}

fn scan_error(err: ScanError, line: usize) -> SyntaxError {
    match err {
        ScanError::UnterminatedLiteral { start } => {
            SyntaxError::new(SyntaxErrorKind::UnterminatedLiteral, line, start + 1)
        }
        ScanError::UnmatchedBracket { found, position } => {
            SyntaxError::new(SyntaxErrorKind::UnmatchedBracket(found), line, position + 1)
        }
    }
}

fn parse_line(line: &Line<'_>) -> Result<Instruction, SyntaxError> {
    let mut cursor = Cursor::at(line.text, line.indent);
    let kind = match cursor.peek() {
        Some('\\') => InstructionKind::Tag(parse_tag(&mut cursor, line.number)?),
        Some('!') => parse_special(&mut cursor, line.number)?,
        _ => {
            return Err(SyntaxError::new(
                SyntaxErrorKind::ExpectedTag,
                line.number,
                cursor.column(),
            ))
        }
    };
    Ok(Instruction::new(kind, line.number))
}

fn parse_tag(cursor: &mut Cursor<'_>, line: usize) -> Result<TagInstruction, SyntaxError> {
    let err = |kind, cursor: &Cursor<'_>| SyntaxError::new(kind, line, cursor.column());

    cursor.bump();
    let name = cursor.take_while(is_component_char);
    if name.is_empty() {
        return Err(err(SyntaxErrorKind::MissingName, cursor));
    }
    let mut tag = TagInstruction::new(name);

    if cursor.eat(':') {
        let alias = cursor.take_while(is_var_char);
        if alias.is_empty() {
            return Err(err(SyntaxErrorKind::MissingName, cursor));
        }
        tag.alias = Some(alias.to_owned());
    }

    loop {
        let skipped = cursor.skip_spaces();
        match cursor.peek() {
            None | Some('#') => break,
            Some(c) if skipped == 0 => return Err(err(SyntaxErrorKind::UnexpectedChar(c), cursor)),
            Some(_) => {}
        }

        let key_column = cursor.column();
        let key = cursor.take_while(is_attr_char);
        if key.is_empty() || key.split(':').any(str::is_empty) {
            let c = if key.is_empty() { cursor.peek().unwrap_or(':') } else { ':' };
            return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedChar(c), line, key_column));
        }

        let value = if cursor.eat('=') {
            let column = cursor.column();
            let text = cursor
                .scan_balanced(OPENERS, CLOSERS, QUOTES, ESCAPE, char::is_whitespace)
                .map_err(|e| scan_error(e, line))?;
            if text.is_empty() {
                return Err(err(SyntaxErrorKind::MissingValue(key.to_owned()), cursor));
            }
            RawLiteral::new(text, column)
        } else {
            RawLiteral::new(BARE_ATTRIBUTE_VALUE, key_column)
        };
        tag.set_attribute(key.to_owned(), value);
    }

    Ok(tag)
}

fn parse_special(cursor: &mut Cursor<'_>, line: usize) -> Result<InstructionKind, SyntaxError> {
    let start_column = cursor.column();
    cursor.bump();
    let word = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
    cursor.skip_spaces();
    let rest = cursor.rest_of_line().trim_end();

    match word {
        "if" => {
            if rest.is_empty() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::MissingCondition,
                    line,
                    start_column,
                ));
            }
            Ok(InstructionKind::Conditional(ConditionalInstruction {
                condition: rest.to_owned(),
            }))
        }
        "enum" => parse_repeat(rest)
            .map(InstructionKind::Repeat)
            .map_err(|msg| {
                SyntaxError::new(SyntaxErrorKind::MalformedRepeat(msg), line, start_column)
            }),
        other => Err(SyntaxError::new(
            SyntaxErrorKind::UnknownSpecial(other.to_owned()),
            line,
            start_column,
        )),
    }
}

/// `<expr>:(index, item)`
fn parse_repeat(rest: &str) -> Result<RepeatInstruction, String> {
    let Some(split) = rest.rfind(":(") else {
        return Err("expected ':(index, item)' after the source".into());
    };
    let source = rest[..split].trim();
    if source.is_empty() {
        return Err("missing source expression".into());
    }
    let aliases = &rest[split + 2..];
    let Some(aliases) = aliases.strip_suffix(')') else {
        return Err("unterminated alias list".into());
    };
    let names: Vec<&str> = aliases.split(',').map(str::trim).collect();
    match names.as_slice() {
        [index, item] if is_identifier(index) && is_identifier(item) => Ok(RepeatInstruction {
            source: source.to_owned(),
            index_alias: (*index).to_owned(),
            item_alias: (*item).to_owned(),
        }),
        [_, _] => Err("aliases must be identifiers".into()),
        _ => Err(format!("expected two aliases, found {}", names.len())),
    }
}
