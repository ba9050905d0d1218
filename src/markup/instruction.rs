//! Instruction tree produced by the markup parser.
//!
//! Instructions are immutable once parsed and shared behind `Rc` by every
//! component tree mounted from the same template.

use std::fmt;
use std::rc::Rc;

/// An unevaluated attribute value, exactly as written in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLiteral {
    pub text: String,
    /// 1-based column where the value starts on its line.
    pub column: usize,
}

impl RawLiteral {
    pub fn new(text: impl Into<String>, column: usize) -> Self {
        Self {
            text: text.into(),
            column,
        }
    }
}

/// One `key=value` pair on a tag line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute key, possibly namespaced with `:` (`pos:grid`, `bind:1`).
    pub key: String,
    pub value: RawLiteral,
}

impl Attribute {
    /// Key split on `:` into its group path.
    pub fn path(&self) -> impl Iterator<Item = &str> {
        self.key.split(':')
    }

    pub fn is_grouped(&self) -> bool {
        self.key.contains(':')
    }
}

/// `\name[:alias] key=value ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInstruction {
    pub name: String,
    pub alias: Option<String>,
    /// Attributes in source order. A repeated key keeps its first position
    /// and the last value.
    pub attributes: Vec<Attribute>,
}

impl TagInstruction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&RawLiteral> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| &a.value)
    }

    pub(crate) fn set_attribute(&mut self, key: String, value: RawLiteral) {
        match self.attributes.iter_mut().find(|a| a.key == key) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { key, value }),
        }
    }
}

/// `!if <expr>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalInstruction {
    pub condition: String,
}

/// `!enum <expr>:(index, item)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatInstruction {
    pub source: String,
    pub index_alias: String,
    pub item_alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    Tag(TagInstruction),
    Conditional(ConditionalInstruction),
    Repeat(RepeatInstruction),
}

/// A parsed markup node and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub children: Vec<Rc<Instruction>>,
    /// 1-based source line.
    pub line: usize,
}

impl Instruction {
    pub fn new(kind: InstructionKind, line: usize) -> Self {
        Self {
            kind,
            children: Vec::new(),
            line,
        }
    }

    pub fn as_tag(&self) -> Option<&TagInstruction> {
        match &self.kind {
            InstructionKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Short label for logs and errors: the tag name, `!if` or `!enum`.
    pub fn label(&self) -> &str {
        match &self.kind {
            InstructionKind::Tag(tag) => &tag.name,
            InstructionKind::Conditional(_) => "!if",
            InstructionKind::Repeat(_) => "!enum",
        }
    }

    /// Number of instructions in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match &self.kind {
            InstructionKind::Tag(tag) => {
                write!(f, "{pad}\\{}", tag.name)?;
                if let Some(alias) = &tag.alias {
                    write!(f, ":{alias}")?;
                }
                for attr in &tag.attributes {
                    write!(f, " {}={}", attr.key, attr.value.text)?;
                }
            }
            InstructionKind::Conditional(cond) => write!(f, "{pad}!if {}", cond.condition)?,
            InstructionKind::Repeat(rep) => write!(
                f,
                "{pad}!enum {}:({}, {})",
                rep.source, rep.index_alias, rep.item_alias
            )?,
        }
        for child in &self.children {
            writeln!(f)?;
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Renders canonical markup: two-space indents, one attribute list per line.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attribute_keeps_first_position() {
        let mut tag = TagInstruction::new("label");
        tag.set_attribute("text".into(), RawLiteral::new("'a'", 8));
        tag.set_attribute("pos:grid".into(), RawLiteral::new("0,0", 17));
        tag.set_attribute("text".into(), RawLiteral::new("'b'", 26));
        let keys: Vec<_> = tag.attributes.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["text", "pos:grid"]);
        assert_eq!(tag.attribute("text").unwrap().text, "'b'");
    }

    #[test]
    fn grouped_attribute_path() {
        let attr = Attribute {
            key: "lay:w:x".into(),
            value: RawLiteral::new("1", 1),
        };
        assert!(attr.is_grouped());
        assert_eq!(attr.path().collect::<Vec<_>>(), ["lay", "w", "x"]);
    }

    #[test]
    fn display_is_canonical_markup() {
        let mut root = Instruction::new(InstructionKind::Tag(TagInstruction::new("frame")), 1);
        let mut cond = Instruction::new(
            InstructionKind::Conditional(ConditionalInstruction {
                condition: "flag".into(),
            }),
            2,
        );
        let mut label = TagInstruction::new("label");
        label.alias = Some("title".into());
        label.set_attribute("text".into(), RawLiteral::new("{name}", 1));
        cond.children
            .push(Rc::new(Instruction::new(InstructionKind::Tag(label), 3)));
        root.children.push(Rc::new(cond));

        assert_eq!(
            root.to_string(),
            "\\frame\n  !if flag\n    \\label:title text={name}"
        );
        assert_eq!(root.node_count(), 3);
    }
}
