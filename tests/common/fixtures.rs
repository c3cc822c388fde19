//! Common test fixtures, using the rstest framework.

use chrono::Utc;
use grappelli::context::{RequestInfo, ToolbarContext};
use grappelli::db::{ConnectionRegistry, QueryLog};
use grappelli::middleware::ToolbarConfig;
use grappelli::ui::TemplateRenderer;
use rstest::*;
use std::sync::Arc;

/// Configuration with the toolbar forced on, overriding the build
/// profile.
#[fixture]
pub fn enabled_config() -> ToolbarConfig {
	ToolbarConfig::new().with_enabled(true)
}

/// Basic request description.
#[fixture]
pub fn test_request_info() -> RequestInfo {
	RequestInfo {
		method: "GET".to_string(),
		path: "/test".to_string(),
		query: Some("foo=bar".to_string()),
		headers: vec![
			("content-type".to_string(), "application/json".to_string()),
			("user-agent".to_string(), "Test Agent".to_string()),
		],
		client_ip: "127.0.0.1".to_string(),
		timestamp: Utc::now(),
	}
}

/// Toolbar context around [`test_request_info`].
#[fixture]
pub fn test_context() -> ToolbarContext {
	ToolbarContext::new(test_request_info())
}

/// Shared template renderer.
#[fixture]
pub fn renderer() -> Arc<TemplateRenderer> {
	Arc::new(TemplateRenderer::new())
}

/// Connection registry with one default log built from the enabled
/// configuration.
#[fixture]
pub fn connections() -> (Arc<ConnectionRegistry>, Arc<QueryLog>) {
	let registry = Arc::new(ConnectionRegistry::new());
	let log = registry.register_default(enabled_config().query_log_config());
	(registry, log)
}
