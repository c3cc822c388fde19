//! Rendering collaborator shared by the toolbar and its panels.
//!
//! Template identifiers are fixed; panels pass a serializable context and
//! get an HTML fragment back. Templates with an `.html` name are
//! autoescaped by Tera, so pre-rendered markup goes through `| safe`
//! explicitly.

use crate::error::ToolbarResult;
use serde::Serialize;
use std::sync::LazyLock;
use tera::{Context, Tera};

static TERA: LazyLock<Tera> = LazyLock::new(|| {
	let mut tera = Tera::default();

	tera.add_raw_template("toolbar.html", include_str!("../templates/toolbar.html"))
		.expect("failed to register toolbar.html");

	tera.add_raw_template(
		"panels/profiling.html",
		include_str!("../templates/panels/profiling.html"),
	)
	.expect("failed to register panels/profiling.html");

	tera.add_raw_template(
		"panels/sql.html",
		include_str!("../templates/panels/sql.html"),
	)
	.expect("failed to register panels/sql.html");

	tera.add_raw_template(
		"panels/validator.html",
		include_str!("../templates/panels/validator.html"),
	)
	.expect("failed to register panels/validator.html");

	tera
});

/// Renders the embedded toolbar templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
	/// Create the renderer.
	pub fn new() -> Self {
		Self
	}

	/// Render `template` with `context`.
	pub fn render<T: Serialize>(&self, template: &str, context: &T) -> ToolbarResult<String> {
		let ctx = Context::from_serialize(context)?;
		Ok(TERA.render(template, &ctx)?)
	}
}
