//! Template-origin context extraction for the SQL panel.

use crate::context::TemplateOrigin;
use serde::Serialize;

/// One line of template source shown around the active node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
	/// Zero-based line number.
	pub num: usize,
	/// Line content including its line break.
	pub content: String,
	/// Whether this is the line containing the active node.
	pub highlight: bool,
}

/// Where in which template a query was issued from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
	/// Template name as known to the renderer.
	pub name: String,
	/// Surrounding source lines with the node's line highlighted.
	pub context: Vec<SourceLine>,
}

/// End offsets of each line (including the line break) in `source`.
fn linebreak_offsets(source: &str) -> Vec<usize> {
	let mut offsets = Vec::new();
	let mut upto = 0;
	for segment in source.split_inclusive('\n') {
		upto += segment.len();
		offsets.push(upto);
	}
	if offsets.is_empty() {
		offsets.push(0);
	}
	offsets
}

/// Extract the source lines around the origin's active span.
///
/// The line holding the span is highlighted; `context_lines` lines either
/// side are included.
pub fn template_info(origin: &TemplateOrigin, context_lines: usize) -> TemplateInfo {
	let source = origin.source.as_ref();
	let (start, end) = origin.span;

	let mut line = 0;
	let mut upto = 0;
	let mut source_lines = Vec::new();
	for (num, next) in linebreak_offsets(source).into_iter().enumerate() {
		if start >= upto && end <= next {
			line = num;
		}
		source_lines.push((num, source[upto..next].to_string()));
		upto = next;
	}

	let top = 1.max(line.saturating_sub(context_lines));
	let bottom = source_lines.len().min(line + 1 + context_lines);

	let context = source_lines
		.into_iter()
		.skip(top)
		.take(bottom.saturating_sub(top))
		.map(|(num, content)| SourceLine {
			num,
			content,
			highlight: num == line,
		})
		.collect();

	TemplateInfo {
		name: origin.name.clone(),
		context,
	}
}
