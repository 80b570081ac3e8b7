//! Stylesheet tree handed to and returned from the converter.

/// A parsed stylesheet: an ordered list of top-level nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
	pub nodes: Vec<Node>,
}

/// A node in a rule list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Rule(Rule),
	AtRule(AtRule),
	Comment(String),
}

/// A style rule: `selector { declarations }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
	pub selector: String,
	pub body: Vec<BodyItem>,
}

/// An item inside a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
	Declaration(Declaration),
	Comment(Comment),
	/// Anything else, such as a nested rule, kept as source text including its
	/// `;` or `{}` block.
	Raw(String),
}

/// A `property: value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
	pub property: String,
	pub value: String,
	pub important: bool,
}

/// A comment inside a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
	/// Comment text without the `/*` `*/` delimiters, trimmed.
	pub text: String,

	/// Whether a line break separates the comment from the previous item.
	pub newline_before: bool,
}

/// An at-rule such as `@media`, `@import` or `@font-face`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
	/// Name without the leading `@`.
	pub name: String,

	/// Prelude text, e.g. the media condition.
	pub params: String,

	/// `None` for statement at-rules ending in `;`.
	pub block: Option<AtRuleBlock>,
}

/// Content of an at-rule block.
#[derive(Debug, Clone, PartialEq)]
pub enum AtRuleBlock {
	/// Nested rules (`@media`, `@supports`, `@keyframes`, ...).
	Rules(Vec<Node>),
	/// Declarations (`@font-face`, `@page`, ...).
	Declarations(Vec<BodyItem>),
}

impl Stylesheet {
	pub fn new(nodes: Vec<Node>) -> Self {
		Stylesheet { nodes }
	}

	/// Iterate every style rule, depth first, in source order.
	pub fn rules(&self) -> Vec<&Rule> {
		let mut out = Vec::new();
		collect_rules(&self.nodes, &mut out);
		out
	}
}

fn collect_rules<'a>(nodes: &'a [Node], out: &mut Vec<&'a Rule>) {
	for node in nodes {
		match node {
			Node::Rule(rule) => out.push(rule),
			Node::AtRule(AtRule {
				block: Some(AtRuleBlock::Rules(children)),
				..
			}) => collect_rules(children, out),
			_ => {}
		}
	}
}

impl Rule {
	pub fn new(selector: impl Into<String>, declarations: Vec<Declaration>) -> Self {
		Rule {
			selector: selector.into(),
			body: declarations.into_iter().map(BodyItem::Declaration).collect(),
		}
	}

	/// The declarations of this rule, skipping comments.
	pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
		self.body.iter().filter_map(|item| match item {
			BodyItem::Declaration(decl) => Some(decl),
			BodyItem::Comment(_) | BodyItem::Raw(_) => None,
		})
	}

	/// Whether a declaration with this property and value already exists.
	pub fn has_declaration(&self, property: &str, value: &str) -> bool {
		self.declarations()
			.any(|d| d.property == property && d.value == value)
	}
}

impl Declaration {
	pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
		Declaration {
			property: property.into(),
			value: value.into(),
			important: false,
		}
	}

	/// Same property and flags, different value.
	pub fn with_value(&self, value: impl Into<String>) -> Self {
		Declaration {
			property: self.property.clone(),
			value: value.into(),
			important: self.important,
		}
	}
}

impl AtRule {
	pub fn media(params: impl Into<String>, nodes: Vec<Node>) -> Self {
		AtRule {
			name: "media".to_string(),
			params: params.into(),
			block: Some(AtRuleBlock::Rules(nodes)),
		}
	}

	pub fn is_media(&self) -> bool {
		self.name.eq_ignore_ascii_case("media")
	}
}
