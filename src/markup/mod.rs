//! Markup language: scanning, tag-line parsing, attribute literals and
//! template caching.

pub mod cursor;
pub mod instruction;
pub mod literal;
pub mod parser;
pub mod template;

pub use cursor::Cursor;
pub use instruction::{
    Attribute, ConditionalInstruction, Instruction, InstructionKind, RawLiteral,
    RepeatInstruction, TagInstruction,
};
pub use literal::{evaluate_literal, literal_value, Literal};
pub use parser::parse;
pub use template::{Template, TemplateCache};
