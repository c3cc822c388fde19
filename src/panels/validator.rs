//! Markup validation panel.
//!
//! Runs only for HTML/XHTML responses. The highlighted source path is
//! trusted output and goes into the template unescaped; the plain fallback
//! path escapes the response body before display. That asymmetry is
//! intentional: the highlighter emits its own markup, the fallback carries
//! untrusted response content.

use super::Panel;
use crate::context::{ResponseInfo, ToolbarContext};
use crate::error::ToolbarResult;
use crate::ui::TemplateRenderer;
use crate::utils::html_escape;
use crate::validator::{MarkupValidator, ValidationError, parse_report};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};

static CONTENT_TYPE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"text/html|application/xhtml\+xml").unwrap());

#[derive(Serialize)]
struct ValidatorContext<'a> {
	errors: &'a [ValidationError],
	source: String,
}

/// Panel that validates the rendered HTML response.
pub struct ValidatorPanel {
	renderer: Arc<TemplateRenderer>,
	validator: Arc<dyn MarkupValidator>,
	errors: Vec<ValidationError>,
	source: Option<String>,
}

impl ValidatorPanel {
	/// Create the panel for one request.
	pub fn new(renderer: Arc<TemplateRenderer>, validator: Arc<dyn MarkupValidator>) -> Self {
		Self {
			renderer,
			validator,
			errors: Vec::new(),
			source: None,
		}
	}

	/// Diagnostics collected from the response, if any.
	pub fn errors(&self) -> &[ValidationError] {
		&self.errors
	}
}

#[async_trait]
impl Panel for ValidatorPanel {
	fn nav_title(&self) -> String {
		self.title()
	}

	fn title(&self) -> String {
		if self.errors.is_empty() {
			"Validator".to_string()
		} else {
			format!("Validator ({})", self.errors.len())
		}
	}

	async fn process_response(
		&mut self,
		_ctx: &ToolbarContext,
		response: &ResponseInfo,
	) -> ToolbarResult<()> {
		let Some(content_type) = &response.content_type else {
			return Ok(());
		};
		if !CONTENT_TYPE_RE.is_match(content_type) {
			return Ok(());
		}
		self.source = Some(response.body.clone());
		let report = self.validator.validate(&response.body)?;
		self.errors = parse_report(&report);
		Ok(())
	}

	fn content(&self) -> ToolbarResult<String> {
		let source = self.source.as_deref().unwrap_or("");
		self.renderer.render(
			"panels/validator.html",
			&ValidatorContext {
				errors: &self.errors,
				source: display_source(source),
			},
		)
	}

	fn tiny_content(&self) -> Option<String> {
		if self.errors.is_empty() {
			None
		} else {
			Some(format!("{} V", self.errors.len()))
		}
	}
}

/// Markup for the source listing: highlighted when the highlighter is
/// available, otherwise escaped into a plain `<pre>` block.
fn display_source(source: &str) -> String {
	#[cfg(feature = "highlight")]
	{
		match highlight::highlight_html(source) {
			Ok(markup) => return markup,
			Err(err) => {
				tracing::debug!(error = %err, "syntax highlighting failed, falling back");
			}
		}
	}
	format!("<pre>{}</pre>", html_escape(source))
}

#[cfg(feature = "highlight")]
mod highlight {
	//! Syntax highlighting for the response source.

	use std::sync::LazyLock;
	use syntect::easy::HighlightLines;
	use syntect::highlighting::{Style, ThemeSet};
	use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
	use syntect::parsing::SyntaxSet;
	use syntect::util::LinesWithEndings;

	static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
	static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

	/// Render `source` as highlighted HTML wrapped in a `<pre>` block.
	pub fn highlight_html(source: &str) -> Result<String, String> {
		let syntax = SYNTAX_SET
			.find_syntax_by_extension("html")
			.ok_or_else(|| "HTML syntax definition missing".to_string())?;
		let theme = &THEME_SET.themes["InspiredGitHub"];

		let mut highlighter = HighlightLines::new(syntax, theme);
		let mut html = String::new();
		for line in LinesWithEndings::from(source) {
			let ranges: Vec<(Style, &str)> = highlighter
				.highlight_line(line, &SYNTAX_SET)
				.map_err(|err| err.to_string())?;
			let line_html = styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No)
				.map_err(|err| err.to_string())?;
			html.push_str(&line_html);
		}
		Ok(format!("<pre class=\"grappelli-highlight\">{html}</pre>"))
	}
}
