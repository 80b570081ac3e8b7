//! Stylesheet tree, parser and serializer.
//!
//! The converter only needs the tree types; the parser and serializer exist
//! so the CLI can run end to end on real files.

pub mod ast;
pub mod parser;
pub mod serializer;

pub use ast::{AtRule, AtRuleBlock, BodyItem, Comment, Declaration, Node, Rule, Stylesheet};
pub use parser::parse_stylesheet;
