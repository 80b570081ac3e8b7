use crate::convert::Converter;
use crate::convert::media::{LANDSCAPE_PARAMS, MediaKind, RuleContext, classify};
use crate::convert::value::Target;
use crate::css::{
	AtRule, AtRuleBlock, BodyItem, Comment, Declaration, Node, Rule, Stylesheet, parse_stylesheet,
};
use crate::error::{Result, TransformError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Comment that suppresses conversion of the next declaration.
pub const IGNORE_NEXT_COMMENT: &str = "px-to-viewport-ignore-next";

/// Comment that suppresses conversion of the declaration before it, on the same line.
pub const IGNORE_PREV_COMMENT: &str = "px-to-viewport-ignore";

/// Outcome for a single declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionResult {
	Unchanged,
	/// Overwrite the value in place.
	Replaced(String),
	/// Keep `fallback` and insert a copy carrying `value` right after it.
	ReplacedAndAppended { value: String, fallback: Declaration },
}

/// A non-fatal problem found while processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
	pub file: Option<PathBuf>,
	pub selector: String,
	pub property: String,
	pub message: String,
}

impl fmt::Display for Warning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(ref file) = self.file {
			write!(f, "{}: ", file.display())?;
		}
		write!(f, "{} {{ {} }}: {}", self.selector, self.property, self.message)
	}
}

/// Summary of processing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
	/// The file was rejected by include/exclude and left untouched.
	pub skipped: bool,

	/// Declarations replaced or appended.
	pub converted: usize,

	/// Rules copied into the landscape block.
	pub landscape_rules: usize,

	pub warnings: Vec<Warning>,
}

/// Mutable state for one file; dropped when the file is done.
struct FileContext<'a> {
	file: Option<&'a Path>,
	report: Report,
	landscape: Vec<Rule>,
}

impl FileContext<'_> {
	fn warn(&mut self, selector: &str, property: &str, message: String) {
		tracing::warn!(
			file = ?self.file,
			selector,
			property,
			"{message}"
		);
		self.report.warnings.push(Warning {
			file: self.file.map(Path::to_path_buf),
			selector: selector.to_string(),
			property: property.to_string(),
			message,
		});
	}
}

impl Converter {
	/// Convert a parsed stylesheet in place.
	///
	/// `path` feeds the include/exclude filters; `None` means the file is
	/// always processed.
	pub fn process(&self, sheet: &mut Stylesheet, path: Option<&Path>) -> Report {
		if let Some(path) = path
			&& !self.accepts_file(path)
		{
			tracing::debug!(path = %path.display(), "file filtered out");
			return Report {
				skipped: true,
				..Default::default()
			};
		}

		let mut ctx = FileContext {
			file: path,
			report: Report::default(),
			landscape: Vec::new(),
		};

		self.walk(&mut sheet.nodes, RuleContext::TopLevel, &mut ctx);

		if !ctx.landscape.is_empty() {
			ctx.report.landscape_rules = ctx.landscape.len();
			let rules = ctx.landscape.into_iter().map(Node::Rule).collect();
			sheet
				.nodes
				.push(Node::AtRule(AtRule::media(LANDSCAPE_PARAMS, rules)));
		}

		ctx.report
	}

	/// Parse, convert and serialize stylesheet source.
	///
	/// Filtered-out files come back byte for byte.
	pub fn process_source(&self, source: &str, path: Option<&Path>) -> Result<(String, Report)> {
		if let Some(path) = path
			&& !self.accepts_file(path)
		{
			let report = Report {
				skipped: true,
				..Default::default()
			};
			return Ok((source.to_string(), report));
		}

		let name = path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
		let mut sheet = parse_stylesheet(source, &name)?;
		let report = self.process(&mut sheet, path);

		Ok((sheet.to_css(), report))
	}

	fn walk(&self, nodes: &mut [Node], context: RuleContext<'_>, ctx: &mut FileContext<'_>) {
		for node in nodes.iter_mut() {
			match node {
				Node::Rule(rule) => self.process_rule(rule, context, ctx),
				Node::AtRule(at_rule) => {
					let is_media = at_rule.is_media();
					let AtRule {
						params,
						block: Some(AtRuleBlock::Rules(children)),
						..
					} = at_rule
					else {
						continue;
					};

					let child_context = if is_media {
						RuleContext::Media(params.as_str())
					} else if let RuleContext::Media(_) = context {
						context
					} else {
						RuleContext::Nested
					};
					self.walk(children, child_context, ctx);
				}
				Node::Comment(_) => {}
			}
		}
	}

	fn process_rule(&self, rule: &mut Rule, context: RuleContext<'_>, ctx: &mut FileContext<'_>) {
		if self.selectors.is_blacklisted(&rule.selector) {
			tracing::debug!(selector = %rule.selector, "selector blacklisted");
			return;
		}

		let convert_here = self.media.allows(context);
		let landscape = match context {
			RuleContext::TopLevel => self.landscape.as_ref(),
			_ => None,
		};
		if !convert_here && landscape.is_none() {
			return;
		}

		let mut ignored = self.strip_ignore_comments(rule, ctx);

		if let Some(target) = landscape {
			self.duplicate_for_landscape(rule, &ignored, target, ctx);
		}

		if !convert_here {
			return;
		}

		let mut i = 0;
		while i < rule.body.len() {
			let BodyItem::Declaration(decl) = &rule.body[i] else {
				i += 1;
				continue;
			};
			if ignored[i] {
				i += 1;
				continue;
			}

			let target = self.target_for(&decl.property, context);
			match self.rewrite_declaration(rule, decl, target, ctx) {
				ConversionResult::Unchanged => i += 1,
				ConversionResult::Replaced(value) => {
					if let BodyItem::Declaration(decl) = &mut rule.body[i] {
						decl.value = value;
					}
					ctx.report.converted += 1;
					i += 1;
				}
				ConversionResult::ReplacedAndAppended { value, fallback } => {
					let converted = fallback.with_value(value);
					rule.body[i] = BodyItem::Declaration(fallback);
					rule.body.insert(i + 1, BodyItem::Declaration(converted));
					ignored.insert(i + 1, true);
					ctx.report.converted += 1;
					i += 2;
				}
			}
		}
	}

	/// Decide what happens to one declaration of `rule`.
	fn rewrite_declaration(
		&self,
		rule: &Rule,
		decl: &Declaration,
		target: &Target,
		ctx: &mut FileContext<'_>,
	) -> ConversionResult {
		let value = match self.convert_value(&rule.selector, decl, target) {
			Ok(Some(value)) => value,
			Ok(None) => return ConversionResult::Unchanged,
			Err(err) => {
				ctx.warn(&rule.selector, &decl.property, format!("transform failed: {err}"));
				return ConversionResult::Unchanged;
			}
		};

		if rule.has_declaration(&decl.property, &value) {
			return ConversionResult::Unchanged;
		}

		tracing::debug!(
			selector = %rule.selector,
			property = %decl.property,
			from = %decl.value,
			to = %value,
			"converted"
		);

		if self.replace {
			ConversionResult::Replaced(value)
		} else {
			ConversionResult::ReplacedAndAppended {
				value,
				fallback: decl.clone(),
			}
		}
	}

	/// The converted value, or `None` if the declaration stays as it is.
	fn convert_value(
		&self,
		selector: &str,
		decl: &Declaration,
		target: &Target,
	) -> std::result::Result<Option<String>, TransformError> {
		if !self.values.mentions_unit(&decl.value) || !self.props.is_convertible(&decl.property) {
			return Ok(None);
		}

		let override_rule = self.overrides.resolve(selector, &decl.property);
		let value = self
			.values
			.convert(&decl.value, target, override_rule, &decl.property)?;
		Ok((value != decl.value).then_some(value))
	}

	fn target_for(&self, property: &str, context: RuleContext<'_>) -> &Target {
		if let (Some(landscape), RuleContext::Media(params)) = (&self.landscape, context)
			&& classify(params) == MediaKind::Landscape
		{
			return landscape;
		}

		if property.contains("font") {
			&self.font
		} else {
			&self.portrait
		}
	}

	/// Copy the convertible declarations of a top-level rule into the landscape block.
	///
	/// Transform failures are dropped here; the portrait pass reports them.
	fn duplicate_for_landscape(
		&self,
		rule: &Rule,
		ignored: &[bool],
		target: &Target,
		ctx: &mut FileContext<'_>,
	) {
		let body: Vec<BodyItem> = rule
			.body
			.iter()
			.zip(ignored)
			.filter_map(|(item, &skip)| match item {
				BodyItem::Declaration(decl) if !skip => self
					.convert_value(&rule.selector, decl, target)
					.ok()
					.flatten()
					.map(|value| BodyItem::Declaration(decl.with_value(value))),
				_ => None,
			})
			.collect();

		if !body.is_empty() {
			ctx.landscape.push(Rule {
				selector: rule.selector.clone(),
				body,
			});
		}
	}

	/// Remove ignore comments and return which body items must not be converted.
	///
	/// The returned flags are aligned with `rule.body` after removal.
	fn strip_ignore_comments(&self, rule: &mut Rule, ctx: &mut FileContext<'_>) -> Vec<bool> {
		let items = std::mem::take(&mut rule.body);
		let mut body = Vec::with_capacity(items.len());
		let mut ignored = Vec::with_capacity(items.len());
		let mut pending: Option<Comment> = None;

		for item in items {
			match item {
				BodyItem::Declaration(decl) => {
					ignored.push(pending.take().is_some());
					body.push(BodyItem::Declaration(decl));
				}
				BodyItem::Comment(comment) => {
					if let Some(unused) = pending.take() {
						body.push(BodyItem::Comment(unused));
						ignored.push(false);
					}

					if comment.text == IGNORE_NEXT_COMMENT {
						pending = Some(comment);
						continue;
					}

					if comment.text == IGNORE_PREV_COMMENT
						&& let Some(BodyItem::Declaration(prev)) = body.last()
					{
						if !comment.newline_before {
							if let Some(flag) = ignored.last_mut() {
								*flag = true;
							}
							continue;
						}
						ctx.warn(
							&rule.selector,
							&prev.property,
							format!(
								"`/* {IGNORE_PREV_COMMENT} */` must follow the declaration on the same line"
							),
						);
					}

					body.push(BodyItem::Comment(comment));
					ignored.push(false);
				}
				BodyItem::Raw(raw) => {
					if let Some(unused) = pending.take() {
						body.push(BodyItem::Comment(unused));
						ignored.push(false);
					}
					body.push(BodyItem::Raw(raw));
					ignored.push(false);
				}
			}
		}

		if let Some(unused) = pending {
			body.push(BodyItem::Comment(unused));
			ignored.push(false);
		}

		rule.body = body;
		ignored
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{MediaQuery, Options, Pattern, RuleSpec, Transform};

	fn converter(options: Options) -> Converter {
		Converter::new(&options).unwrap()
	}

	fn run(options: Options, source: &str) -> (Stylesheet, Report) {
		let mut sheet = parse_stylesheet(source, "test.css").unwrap();
		let report = converter(options).process(&mut sheet, None);
		(sheet, report)
	}

	fn values(rule: &Rule) -> Vec<String> {
		rule.declarations().map(ToString::to_string).collect()
	}

	#[test]
	fn test_replace_in_place() {
		let (sheet, report) = run(Options::default(), ".a { width: 100px; height: 16px; color: red }");
		assert_eq!(
			values(sheet.rules()[0]),
			vec!["width: 31.25vw", "height: 5vw", "color: red"]
		);
		assert_eq!(report.converted, 2);
		assert!(report.warnings.is_empty());
	}

	#[test]
	fn test_append_fallback_when_not_replacing() {
		let options = Options {
			replace: false,
			..Default::default()
		};
		let (sheet, report) = run(options, ".a { width: 100px; margin: 0 }");
		assert_eq!(
			values(sheet.rules()[0]),
			vec!["width: 100px", "width: 31.25vw", "margin: 0"]
		);
		assert_eq!(report.converted, 1);
	}

	#[test]
	fn test_existing_converted_declaration_not_duplicated() {
		let options = Options {
			replace: false,
			..Default::default()
		};
		let (sheet, report) = run(options, ".a { width: 100px; width: 31.25vw }");
		assert_eq!(
			values(sheet.rules()[0]),
			vec!["width: 100px", "width: 31.25vw"]
		);
		assert_eq!(report.converted, 0);
	}

	#[test]
	fn test_important_survives() {
		let (sheet, _) = run(Options::default(), ".a { width: 16px !important }");
		assert_eq!(values(sheet.rules()[0]), vec!["width: 5vw !important"]);
	}

	#[test]
	fn test_prop_list_excludes_fonts() {
		let options = Options {
			prop_list: vec!["*".to_string(), "!font*".to_string()],
			..Default::default()
		};
		let (sheet, _) = run(options, ".a { font-size: 16px; margin: 16px; padding: 32px }");
		assert_eq!(
			values(sheet.rules()[0]),
			vec!["font-size: 16px", "margin: 5vw", "padding: 10vw"]
		);
	}

	#[test]
	fn test_font_properties_use_font_unit() {
		let options = Options {
			font_viewport_unit: "vmin".to_string(),
			..Default::default()
		};
		let (sheet, _) = run(options, ".a { font-size: 16px; width: 16px }");
		assert_eq!(
			values(sheet.rules()[0]),
			vec!["font-size: 5vmin", "width: 5vw"]
		);
	}

	#[test]
	fn test_selector_blacklist() {
		let options = Options {
			selector_black_list: vec![Pattern::literal("body"), Pattern::regex("^html$")],
			..Default::default()
		};
		let (sheet, _) = run(
			options,
			".body-class { width: 16px } html { width: 16px } .html { width: 16px }",
		);
		let rules = sheet.rules();
		assert_eq!(values(rules[0]), vec!["width: 16px"]);
		assert_eq!(values(rules[1]), vec!["width: 16px"]);
		assert_eq!(values(rules[2]), vec!["width: 5vw"]);
	}

	#[test]
	fn test_media_blocks_skipped_by_default() {
		let (sheet, _) = run(
			Options::default(),
			"@media (min-width: 768px) { .a { width: 16px } }",
		);
		assert_eq!(values(sheet.rules()[0]), vec!["width: 16px"]);
	}

	#[test]
	fn test_media_blocks_converted_when_enabled() {
		let options = Options {
			media_query: MediaQuery::Enabled(true),
			..Default::default()
		};
		let (sheet, _) = run(options, "@media (min-width: 768px) { .a { width: 16px } }");
		assert_eq!(values(sheet.rules()[0]), vec!["width: 5vw"]);
	}

	#[test]
	fn test_media_blocks_matching_pattern() {
		let options = Options {
			media_query: MediaQuery::Matching(vec![Pattern::regex("min-width")]),
			..Default::default()
		};
		let (sheet, _) = run(
			options,
			"@media (min-width: 768px) { .a { width: 16px } } @media print { .b { width: 16px } }",
		);
		let rules = sheet.rules();
		assert_eq!(values(rules[0]), vec!["width: 5vw"]);
		assert_eq!(values(rules[1]), vec!["width: 16px"]);
	}

	#[test]
	fn test_non_media_at_rules_are_transparent() {
		let (sheet, _) = run(
			Options::default(),
			"@supports (display: grid) { .a { width: 16px } } @keyframes k { from { left: 32px } }",
		);
		let rules = sheet.rules();
		assert_eq!(values(rules[0]), vec!["width: 5vw"]);
		assert_eq!(values(rules[1]), vec!["left: 10vw"]);
	}

	#[test]
	fn test_landscape_block_appended() {
		let options = Options {
			landscape: true,
			..Default::default()
		};
		let (sheet, report) = run(options, ".a { width: 16px; color: red } .b { color: blue }");

		assert_eq!(report.landscape_rules, 1);
		assert_eq!(values(sheet.rules()[0]), vec!["width: 5vw", "color: red"]);

		match sheet.nodes.last() {
			Some(Node::AtRule(at_rule)) => {
				assert_eq!(at_rule.params, "(orientation: landscape)");
				match &at_rule.block {
					Some(AtRuleBlock::Rules(nodes)) => {
						assert_eq!(nodes.len(), 1);
						let Node::Rule(rule) = &nodes[0] else {
							panic!("Expected a rule");
						};
						assert_eq!(rule.selector, ".a");
						assert_eq!(values(rule), vec!["width: 2.8169vw"]);
					}
					other => panic!("Expected rules, got {other:?}"),
				}
			}
			other => panic!("Expected landscape block, got {other:?}"),
		}
	}

	#[test]
	fn test_landscape_uses_landscape_unit() {
		let options = Options {
			landscape: true,
			landscape_unit: "vh".to_string(),
			landscape_width: 1000.0,
			..Default::default()
		};
		let (sheet, _) = run(options, ".a { height: 50px }");
		let rules = sheet.rules();
		assert_eq!(values(rules[1]), vec!["height: 5vh"]);
	}

	#[test]
	fn test_landscape_media_uses_landscape_settings() {
		let options = Options {
			landscape: true,
			media_query: MediaQuery::Enabled(true),
			..Default::default()
		};
		let (sheet, report) = run(
			options,
			"@media (orientation: landscape) { .a { width: 568px } }",
		);
		assert_eq!(report.landscape_rules, 0);
		assert_eq!(sheet.nodes.len(), 1);
		assert_eq!(values(sheet.rules()[0]), vec!["width: 100vw"]);
	}

	#[test]
	fn test_no_landscape_block_without_conversions() {
		let options = Options {
			landscape: true,
			..Default::default()
		};
		let (sheet, report) = run(options, ".a { color: red; margin: 0px }");
		assert_eq!(report.landscape_rules, 0);
		assert_eq!(sheet.nodes.len(), 1);
	}

	#[test]
	fn test_override_rule_bypasses_scaling() {
		let options = Options {
			rules: vec![RuleSpec::new(
				Pattern::literal("line-height"),
				Transform::Template("1.5".to_string()),
			)],
			..Default::default()
		};
		let (sheet, _) = run(options, ".a { line-height: 24px; width: 16px }");
		assert_eq!(
			values(sheet.rules()[0]),
			vec!["line-height: 1.5", "width: 5vw"]
		);
	}

	#[test]
	fn test_override_returning_original_is_unchanged() {
		let options = Options {
			replace: false,
			rules: vec![RuleSpec::new(
				Pattern::literal("border-width"),
				Transform::Template("{pixels}px".to_string()),
			)],
			..Default::default()
		};
		let (sheet, report) = run(options, ".a { border-width: 2px }");
		assert_eq!(values(sheet.rules()[0]), vec!["border-width: 2px"]);
		assert_eq!(report.converted, 0);
	}

	#[test]
	fn test_failing_transform_is_isolated() {
		let options = Options {
			rules: vec![RuleSpec::new(
				Pattern::literal("width"),
				Transform::custom(|_, _, _| Err(TransformError::new("nope"))),
			)],
			..Default::default()
		};
		let mut sheet = parse_stylesheet(".a { width: 16px; height: 16px }", "a.css").unwrap();
		let report = converter(options).process(&mut sheet, Some(Path::new("src/a.css")));

		assert_eq!(
			values(sheet.rules()[0]),
			vec!["width: 16px", "height: 5vw"]
		);
		assert_eq!(report.converted, 1);
		assert_eq!(
			report.warnings,
			vec![Warning {
				file: Some(PathBuf::from("src/a.css")),
				selector: ".a".to_string(),
				property: "width".to_string(),
				message: "transform failed: nope".to_string(),
			}]
		);
	}

	#[test]
	fn test_failing_transform_warns_once_with_landscape() {
		let options = Options {
			landscape: true,
			rules: vec![RuleSpec::new(
				Pattern::literal("width"),
				Transform::custom(|_, _, _| Err(TransformError::new("nope"))),
			)],
			..Default::default()
		};
		let (sheet, report) = run(options, ".a { width: 16px }");

		assert_eq!(values(sheet.rules()[0]), vec!["width: 16px"]);
		assert_eq!(report.warnings.len(), 1);
		assert_eq!(report.warnings[0].property, "width");
		assert_eq!(report.landscape_rules, 0);
	}

	#[test]
	fn test_nested_rules_survive_conversion() {
		let converter = converter(Options::default());
		let (css, report) = converter
			.process_source(
				".a { width: 16px; .b { height: 16px } &:hover { top: 32px } }",
				None,
			)
			.unwrap();

		assert_eq!(
			css,
			".a {\n  width: 5vw;\n  .b { height: 16px }\n  &:hover { top: 32px }\n}\n"
		);
		assert_eq!(report.converted, 1);
	}

	#[test]
	fn test_include_rejects_whole_file() {
		let options = Options {
			include: Some(vec![Pattern::regex("mobile")]),
			..Default::default()
		};
		let converter = converter(options);

		let mut sheet = parse_stylesheet(".a { width: 16px }", "a.css").unwrap();
		let report = converter.process(&mut sheet, Some(Path::new("src/desktop/a.css")));
		assert!(report.skipped);
		assert_eq!(values(sheet.rules()[0]), vec!["width: 16px"]);

		let report = converter.process(&mut sheet, Some(Path::new("src/mobile/a.css")));
		assert!(!report.skipped);
		assert_eq!(values(sheet.rules()[0]), vec!["width: 5vw"]);
	}

	#[test]
	fn test_ignore_next_comment() {
		let (sheet, _) = run(
			Options::default(),
			".a {\n  /* px-to-viewport-ignore-next */\n  width: 16px;\n  height: 16px;\n}",
		);
		let rule = sheet.rules()[0];
		assert_eq!(values(rule), vec!["width: 16px", "height: 5vw"]);
		assert!(!rule.body.iter().any(|i| matches!(i, BodyItem::Comment(_))));
	}

	#[test]
	fn test_ignore_prev_comment_same_line() {
		let (sheet, report) = run(
			Options::default(),
			".a {\n  width: 16px; /* px-to-viewport-ignore */\n  height: 16px;\n}",
		);
		let rule = sheet.rules()[0];
		assert_eq!(values(rule), vec!["width: 16px", "height: 5vw"]);
		assert_eq!(rule.body.len(), 2);
		assert!(report.warnings.is_empty());
	}

	#[test]
	fn test_ignore_prev_comment_on_new_line_warns() {
		let (sheet, report) = run(
			Options::default(),
			".a {\n  width: 16px;\n  /* px-to-viewport-ignore */\n}",
		);
		let rule = sheet.rules()[0];
		assert_eq!(values(rule), vec!["width: 5vw"]);
		assert_eq!(rule.body.len(), 2);
		assert_eq!(report.warnings.len(), 1);
		assert_eq!(report.warnings[0].property, "width");
	}

	#[test]
	fn test_process_source_round_trip() {
		let converter = converter(Options::default());
		let (css, report) = converter
			.process_source(".a{width:16px}", Some(Path::new("a.css")))
			.unwrap();
		assert_eq!(css, ".a {\n  width: 5vw;\n}\n");
		assert_eq!(report.converted, 1);
	}

	#[test]
	fn test_process_source_passes_filtered_file_through() {
		let options = Options {
			exclude: Some(vec![Pattern::literal("vendor")]),
			..Default::default()
		};
		let source = ".a{width:16px}";
		let (css, report) = converter(options)
			.process_source(source, Some(Path::new("vendor/a.css")))
			.unwrap();
		assert_eq!(css, source);
		assert!(report.skipped);
	}
}
