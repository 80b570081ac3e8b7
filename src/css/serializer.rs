use crate::css::ast::{AtRule, AtRuleBlock, BodyItem, Declaration, Node, Rule, Stylesheet};
use std::fmt::{self, Write};

const INDENT: &str = "  ";

impl Stylesheet {
	/// Serialize back to CSS text.
	pub fn to_css(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for Stylesheet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write_nodes(f, &self.nodes, 0)
	}
}

impl fmt::Display for Declaration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.property, self.value)?;
		if self.important {
			f.write_str(" !important")?;
		}
		Ok(())
	}
}

fn write_nodes(out: &mut impl Write, nodes: &[Node], depth: usize) -> fmt::Result {
	for node in nodes {
		match node {
			Node::Rule(rule) => write_rule(out, rule, depth)?,
			Node::AtRule(at_rule) => write_at_rule(out, at_rule, depth)?,
			Node::Comment(text) => {
				indent(out, depth)?;
				writeln!(out, "/* {text} */")?;
			}
		}
	}
	Ok(())
}

fn write_rule(out: &mut impl Write, rule: &Rule, depth: usize) -> fmt::Result {
	indent(out, depth)?;
	writeln!(out, "{} {{", rule.selector)?;
	write_body(out, &rule.body, depth + 1)?;
	indent(out, depth)?;
	out.write_str("}\n")
}

fn write_at_rule(out: &mut impl Write, at_rule: &AtRule, depth: usize) -> fmt::Result {
	indent(out, depth)?;
	write!(out, "@{}", at_rule.name)?;
	if !at_rule.params.is_empty() {
		write!(out, " {}", at_rule.params)?;
	}

	match &at_rule.block {
		None => out.write_str(";\n"),
		Some(block) => {
			out.write_str(" {\n")?;
			match block {
				AtRuleBlock::Rules(nodes) => write_nodes(out, nodes, depth + 1)?,
				AtRuleBlock::Declarations(items) => write_body(out, items, depth + 1)?,
			}
			indent(out, depth)?;
			out.write_str("}\n")
		}
	}
}

fn write_body(out: &mut impl Write, items: &[BodyItem], depth: usize) -> fmt::Result {
	for item in items {
		indent(out, depth)?;
		match item {
			BodyItem::Declaration(decl) => writeln!(out, "{decl};")?,
			BodyItem::Comment(comment) => writeln!(out, "/* {} */", comment.text)?,
			BodyItem::Raw(raw) => writeln!(out, "{raw}")?,
		}
	}
	Ok(())
}

fn indent(out: &mut impl Write, depth: usize) -> fmt::Result {
	for _ in 0..depth {
		out.write_str(INDENT)?;
	}
	Ok(())
}
