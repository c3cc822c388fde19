//! Per-request panel construction.

use super::{Panel, ProfilingPanel, SqlPanel, ValidatorPanel};
use crate::db::ConnectionRegistry;
use crate::middleware::ToolbarConfig;
use crate::ui::TemplateRenderer;
use crate::validator::MarkupValidator;
use std::sync::Arc;

/// Collaborators a panel factory may capture.
#[derive(Clone)]
pub struct PanelDeps {
	/// Toolbar configuration.
	pub config: Arc<ToolbarConfig>,
	/// Named query logs registered by the application.
	pub connections: Arc<ConnectionRegistry>,
	/// Rendering collaborator shared by all panels.
	pub renderer: Arc<TemplateRenderer>,
	/// Markup validator collaborator.
	pub validator: Arc<dyn MarkupValidator>,
}

type PanelFactory = Box<dyn Fn(&PanelDeps) -> Box<dyn Panel> + Send + Sync>;

/// Ordered set of panel factories.
///
/// Panels are instantiated fresh for every observed request, in
/// registration order; that order is also hook-invocation and display
/// order.
pub struct PanelRegistry {
	factories: Vec<PanelFactory>,
}

impl PanelRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self {
			factories: Vec::new(),
		}
	}

	/// Registry with the built-in panels: profiling, SQL, validator.
	pub fn with_default_panels() -> Self {
		let mut registry = Self::new();
		registry.register(|deps: &PanelDeps| {
			Box::new(ProfilingPanel::new(deps.renderer.clone())) as Box<dyn Panel>
		});
		registry.register(|deps: &PanelDeps| {
			Box::new(SqlPanel::new(deps.renderer.clone(), deps.connections.clone()))
				as Box<dyn Panel>
		});
		registry.register(|deps: &PanelDeps| {
			Box::new(ValidatorPanel::new(
				deps.renderer.clone(),
				deps.validator.clone(),
			)) as Box<dyn Panel>
		});
		registry
	}

	/// Add a panel factory at the end of the order.
	pub fn register<F>(&mut self, factory: F)
	where
		F: Fn(&PanelDeps) -> Box<dyn Panel> + Send + Sync + 'static,
	{
		self.factories.push(Box::new(factory));
	}

	/// Number of registered factories.
	pub fn len(&self) -> usize {
		self.factories.len()
	}

	/// Whether no factories are registered.
	pub fn is_empty(&self) -> bool {
		self.factories.is_empty()
	}

	/// Build one panel instance per factory for a new request.
	pub fn instantiate(&self, deps: &PanelDeps) -> Vec<Box<dyn Panel>> {
		self.factories.iter().map(|factory| factory(deps)).collect()
	}
}

impl Default for PanelRegistry {
	fn default() -> Self {
		Self::with_default_panels()
	}
}
