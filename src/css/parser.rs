//! Tokenizer-driven stylesheet parser.
//!
//! Builds the rule tree the converter works on. It is lenient: block items
//! that are not `name: value` (nested rules, hacks) are kept verbatim, and
//! nothing is validated against the CSS grammar.

use crate::css::ast::{AtRule, AtRuleBlock, BodyItem, Comment, Declaration, Node, Rule, Stylesheet};
use crate::error::{Px2VwError, Result};
use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};

type ParseResult<'i, T> = std::result::Result<T, ParseError<'i, ()>>;

/// Parse stylesheet source. `path` is only used in error messages.
pub fn parse_stylesheet(source: &str, path: &str) -> Result<Stylesheet> {
	let mut input = ParserInput::new(source);
	let mut parser = Parser::new(&mut input);

	parse_rule_list(&mut parser)
		.map(Stylesheet::new)
		.map_err(|err| Px2VwError::StylesheetParse {
			path: path.to_string(),
			line: err.location.line + 1,
			column: err.location.column,
			message: format!("{:?}", err.kind),
		})
}

/// Parse a list of rules, at-rules and comments until the input is exhausted.
fn parse_rule_list<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<Node>> {
	let mut nodes = Vec::new();

	loop {
		let state = parser.state();
		let token = match parser.next_including_whitespace_and_comments() {
			Ok(token) => token.clone(),
			Err(_) => break,
		};

		match token {
			Token::WhiteSpace(_) | Token::Semicolon | Token::CDO | Token::CDC => {}
			Token::Comment(text) => nodes.push(Node::Comment(text.trim().to_string())),
			Token::AtKeyword(name) => {
				let at_rule = parse_at_rule(parser, name.to_string())?;
				nodes.push(Node::AtRule(at_rule));
			}
			_ => {
				parser.reset(&state);
				nodes.push(Node::Rule(parse_style_rule(parser)?));
			}
		}
	}

	Ok(nodes)
}

/// Parse `selector { body }`.
fn parse_style_rule<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Rule> {
	let start = parser.position();
	parser.parse_until_before(Delimiter::CurlyBracketBlock, consume_all)?;
	let selector = collapse_whitespace(parser.slice_from(start));

	let token = parser.next()?.clone();
	if !matches!(token, Token::CurlyBracketBlock) {
		return Err(parser.new_unexpected_token_error(token));
	}

	let body = parser.parse_nested_block(parse_body)?;
	Ok(Rule { selector, body })
}

/// Parse the prelude and optional block of an at-rule.
fn parse_at_rule<'i>(parser: &mut Parser<'i, '_>, name: String) -> ParseResult<'i, AtRule> {
	let start = parser.position();
	parser.parse_until_before(
		Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
		consume_all,
	)?;
	let params = collapse_whitespace(parser.slice_from(start));

	let has_block = matches!(parser.next(), Ok(Token::CurlyBracketBlock));
	let block = if !has_block {
		None
	} else if contains_rules(&name) {
		Some(AtRuleBlock::Rules(parser.parse_nested_block(parse_rule_list)?))
	} else {
		Some(AtRuleBlock::Declarations(
			parser.parse_nested_block(parse_body)?,
		))
	};

	Ok(AtRule {
		name,
		params,
		block,
	})
}

/// Parse the inside of a declaration block.
fn parse_body<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<BodyItem>> {
	let mut items = Vec::new();
	let mut newline_before = false;

	loop {
		let state = parser.state();
		let token = match parser.next_including_whitespace_and_comments() {
			Ok(token) => token.clone(),
			Err(_) => break,
		};

		match token {
			Token::WhiteSpace(ws) => {
				if ws.contains('\n') {
					newline_before = true;
				}
				continue;
			}
			Token::Comment(text) => items.push(BodyItem::Comment(Comment {
				text: text.trim().to_string(),
				newline_before,
			})),
			Token::Semicolon => {}
			_ => {
				parser.reset(&state);
				match parser.try_parse(parse_declaration) {
					Ok(decl) => items.push(BodyItem::Declaration(decl)),
					Err(_) => items.push(BodyItem::Raw(parse_raw_item(parser)?)),
				}
			}
		}

		newline_before = false;
	}

	Ok(items)
}

/// Parse `name: value`. The terminating `;` is left in place.
///
/// Fails when the item turns out to open a block, e.g. `a:hover { ... }`.
fn parse_declaration<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Declaration> {
	let property = parser.expect_ident()?.to_string();
	parser.skip_whitespace();
	parser.expect_colon()?;

	let start = parser.position();
	parser.parse_until_before(
		Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
		consume_all,
	)?;
	let (value, important) = split_important(parser.slice_from(start).trim());

	let end = parser.state();
	if matches!(parser.next(), Ok(Token::CurlyBracketBlock)) {
		return Err(parser.new_custom_error(()));
	}
	parser.reset(&end);

	Ok(Declaration {
		property,
		value,
		important,
	})
}

/// Take an unrecognized item verbatim, through its `;` or nested block.
fn parse_raw_item<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, String> {
	let start = parser.position();
	parser.parse_until_before(
		Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
		consume_all,
	)?;

	if matches!(parser.next(), Ok(Token::CurlyBracketBlock)) {
		parser.parse_nested_block(consume_all)?;
	}

	let raw = parser.slice_from(start).trim();
	tracing::trace!(raw, "keeping block item verbatim");
	Ok(raw.to_string())
}

fn consume_all<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, ()> {
	while parser.next_including_whitespace_and_comments().is_ok() {}
	Ok(())
}

/// At-rules whose block holds rules rather than declarations.
fn contains_rules(name: &str) -> bool {
	let name = name.to_ascii_lowercase();
	matches!(
		name.as_str(),
		"media"
			| "supports"
			| "document"
			| "-moz-document"
			| "layer"
			| "container"
			| "scope"
			| "starting-style"
	) || name.ends_with("keyframes")
}

fn split_important(raw: &str) -> (String, bool) {
	if let Some(idx) = raw.rfind('!')
		&& raw[idx + 1..].trim().eq_ignore_ascii_case("important")
	{
		return (raw[..idx].trim_end().to_string(), true);
	}
	(raw.to_string(), false)
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(source: &str) -> Stylesheet {
		parse_stylesheet(source, "test.css").unwrap()
	}

	#[test]
	fn test_parse_simple_rule() {
		let sheet = parse(".a { width: 100px; margin: 0 auto }");
		assert_eq!(
			sheet.nodes,
			vec![Node::Rule(Rule::new(
				".a",
				vec![
					Declaration::new("width", "100px"),
					Declaration::new("margin", "0 auto"),
				]
			))]
		);
	}

	#[test]
	fn test_parse_function_values_and_important() {
		let sheet = parse(
			".a { width: calc(100% - 20px) !important; background: url(\"a.png\") no-repeat; }",
		);
		let rule = sheet.rules()[0];
		let decls: Vec<_> = rule.declarations().collect();

		assert_eq!(decls[0].value, "calc(100% - 20px)");
		assert!(decls[0].important);
		assert_eq!(decls[1].value, "url(\"a.png\") no-repeat");
		assert!(!decls[1].important);
	}

	#[test]
	fn test_parse_multiline_selector_is_collapsed() {
		let sheet = parse("h1,\n  h2 > p {\n color: red;\n}");
		assert_eq!(sheet.rules()[0].selector, "h1, h2 > p");
	}

	#[test]
	fn test_parse_media_block() {
		let sheet = parse("@media (min-width: 768px) { .a { width: 10px } }");
		match &sheet.nodes[0] {
			Node::AtRule(at_rule) => {
				assert!(at_rule.is_media());
				assert_eq!(at_rule.params, "(min-width: 768px)");
				match &at_rule.block {
					Some(AtRuleBlock::Rules(nodes)) => assert_eq!(nodes.len(), 1),
					other => panic!("Expected nested rules, got {other:?}"),
				}
			}
			other => panic!("Expected at-rule, got {other:?}"),
		}
	}

	#[test]
	fn test_parse_statement_and_declaration_at_rules() {
		let sheet = parse("@import \"x.css\";\n@font-face { font-family: Foo; src: url(foo.woff); }");
		assert_eq!(sheet.nodes.len(), 2);

		match &sheet.nodes[0] {
			Node::AtRule(at_rule) => {
				assert_eq!(at_rule.name, "import");
				assert_eq!(at_rule.params, "\"x.css\"");
				assert!(at_rule.block.is_none());
			}
			other => panic!("Expected at-rule, got {other:?}"),
		}
		match &sheet.nodes[1] {
			Node::AtRule(AtRule {
				block: Some(AtRuleBlock::Declarations(items)),
				..
			}) => assert_eq!(items.len(), 2),
			other => panic!("Expected @font-face declarations, got {other:?}"),
		}
	}

	#[test]
	fn test_parse_comments_track_line_breaks() {
		let sheet = parse(
			".a {\n  /* px-to-viewport-ignore-next */\n  width: 10px; /* px-to-viewport-ignore */\n  height: 10px;\n  /* trailing */\n}",
		);
		let rule = sheet.rules()[0];

		assert_eq!(
			rule.body,
			vec![
				BodyItem::Comment(Comment {
					text: "px-to-viewport-ignore-next".to_string(),
					newline_before: true,
				}),
				BodyItem::Declaration(Declaration::new("width", "10px")),
				BodyItem::Comment(Comment {
					text: "px-to-viewport-ignore".to_string(),
					newline_before: false,
				}),
				BodyItem::Declaration(Declaration::new("height", "10px")),
				BodyItem::Comment(Comment {
					text: "trailing".to_string(),
					newline_before: true,
				}),
			]
		);
	}

	#[test]
	fn test_parse_keeps_garbage_in_block_verbatim() {
		let sheet = parse(".a { 12px; width: 1px; color red; height: 2px }");
		let rule = sheet.rules()[0];
		let props: Vec<_> = rule.declarations().map(|d| d.property.as_str()).collect();
		assert_eq!(props, vec!["width", "height"]);
		assert_eq!(rule.body[0], BodyItem::Raw("12px;".to_string()));
		assert_eq!(rule.body[2], BodyItem::Raw("color red;".to_string()));
	}

	#[test]
	fn test_parse_nested_rules_kept_as_raw_items() {
		let sheet = parse(".a { width: 16px; .b { height: 16px } &:hover { top: 32px } div:focus { left: 1px } }");
		let rule = sheet.rules()[0];

		assert_eq!(
			rule.body,
			vec![
				BodyItem::Declaration(Declaration::new("width", "16px")),
				BodyItem::Raw(".b { height: 16px }".to_string()),
				BodyItem::Raw("&:hover { top: 32px }".to_string()),
				BodyItem::Raw("div:focus { left: 1px }".to_string()),
			]
		);
	}

	#[test]
	fn test_parse_declaration_after_nested_rule() {
		let sheet = parse(".a { .b { top: 0 } width: 16px }");
		let decls: Vec<_> = sheet.rules()[0].declarations().collect();
		assert_eq!(decls, vec![&Declaration::new("width", "16px")]);
	}

	#[test]
	fn test_parse_custom_property() {
		let sheet = parse(":root { --gap: 8px; }");
		let decl = sheet.rules()[0].declarations().next().unwrap();
		assert_eq!(decl.property, "--gap");
		assert_eq!(decl.value, "8px");
	}
}
