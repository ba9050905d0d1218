//! Component tree evaluation.

pub mod component_tree;
pub mod node;

pub use component_tree::{ComponentTree, TreeOptions, PLACEHOLDER_KIND};
pub use node::{ComponentId, ComponentKind};
