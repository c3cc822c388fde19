//! Toolbar rendering and response injection.

pub mod injection;
pub mod templates;

pub use injection::inject_toolbar;
pub use templates::TemplateRenderer;

use crate::error::ToolbarResult;
use crate::panels::Panel;
use serde::Serialize;

#[derive(Serialize)]
struct PanelEntry {
	nav_title: String,
	nav_subtitle: String,
	title: String,
	url: String,
	content: String,
	tiny_content: Option<String>,
}

#[derive(Serialize)]
struct ToolbarTemplateContext {
	panels: Vec<PanelEntry>,
}

/// Assemble the toolbar fragment from the request's panels.
///
/// Display hooks run here, after all lifecycle hooks completed; a panel
/// whose `content` fails aborts the whole toolbar render.
pub fn render_toolbar(
	renderer: &TemplateRenderer,
	panels: &[Box<dyn Panel>],
) -> ToolbarResult<String> {
	let mut entries = Vec::with_capacity(panels.len());
	for panel in panels {
		entries.push(PanelEntry {
			nav_title: panel.nav_title(),
			nav_subtitle: panel.nav_subtitle(),
			title: panel.title(),
			url: panel.url(),
			content: panel.content()?,
			tiny_content: panel.tiny_content(),
		});
	}
	renderer.render("toolbar.html", &ToolbarTemplateContext { panels: entries })
}
