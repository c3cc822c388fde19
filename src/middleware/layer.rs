//! Debug toolbar Tower layer.

use crate::db::ConnectionRegistry;
use crate::middleware::{DebugToolbarService, ToolbarConfig};
use crate::panels::PanelRegistry;
use crate::ui::TemplateRenderer;
use crate::validator::{MarkupValidator, TidyValidator};
use std::sync::Arc;
use tower::Layer;

/// Tower layer installing the debug toolbar around a service.
#[derive(Clone)]
pub struct DebugToolbarLayer {
	config: Arc<ToolbarConfig>,
	registry: Arc<PanelRegistry>,
	connections: Arc<ConnectionRegistry>,
	renderer: Arc<TemplateRenderer>,
	validator: Arc<dyn MarkupValidator>,
}

impl DebugToolbarLayer {
	/// Create a layer with the default panels (profiling, SQL,
	/// validator).
	///
	/// `connections` carries the query logs the application registered;
	/// an empty registry simply yields an empty SQL panel.
	pub fn new(config: ToolbarConfig, connections: Arc<ConnectionRegistry>) -> Self {
		Self {
			config: Arc::new(config),
			registry: Arc::new(PanelRegistry::with_default_panels()),
			connections,
			renderer: Arc::new(TemplateRenderer::new()),
			validator: Arc::new(TidyValidator::new()),
		}
	}

	/// Layer with default configuration and no registered connections.
	pub fn with_default() -> Self {
		Self::new(ToolbarConfig::default(), Arc::new(ConnectionRegistry::new()))
	}

	/// Replace the panel registry.
	pub fn with_registry(mut self, registry: PanelRegistry) -> Self {
		self.registry = Arc::new(registry);
		self
	}

	/// Replace the markup validator collaborator.
	pub fn with_validator(mut self, validator: Arc<dyn MarkupValidator>) -> Self {
		self.validator = validator;
		self
	}
}

impl Default for DebugToolbarLayer {
	fn default() -> Self {
		Self::with_default()
	}
}

impl<S> Layer<S> for DebugToolbarLayer {
	type Service = DebugToolbarService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		DebugToolbarService {
			inner,
			config: self.config.clone(),
			registry: self.registry.clone(),
			connections: self.connections.clone(),
			renderer: self.renderer.clone(),
			validator: self.validator.clone(),
		}
	}
}
