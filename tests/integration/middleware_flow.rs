//! Toolbar middleware flow: gating, lifecycle order, injection.

use crate::common::fixtures::{connections, enabled_config};
use crate::common::mock_panel::MockPanel;
use axum::Router;
use axum::body::Body;
use axum::response::Html;
use axum::routing::get;
use grappelli::db::{ConnectionRegistry, QueryLog};
use grappelli::error::ToolbarResult;
use grappelli::middleware::{DebugToolbarLayer, ToolbarConfig};
use grappelli::panels::{Panel, PanelRegistry};
use grappelli::validator::MarkupValidator;
use http::Request;
use http_body_util::BodyExt;
use rstest::*;
use serial_test::serial;
use std::sync::Arc;
use tower::util::ServiceExt;

const PAGE: &str = "<html><body><h1>users</h1></body></html>";

struct StubValidator {
	report: &'static str,
}

impl MarkupValidator for StubValidator {
	fn validate(&self, _source: &str) -> ToolbarResult<String> {
		Ok(self.report.to_string())
	}
}

fn html_app(layer: DebugToolbarLayer) -> Router {
	Router::new()
		.route("/", get(|| async { Html(PAGE) }))
		.layer(layer)
}

async fn body_text(response: axum::response::Response) -> String {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	String::from_utf8(bytes.to_vec()).unwrap()
}

fn request() -> Request<Body> {
	Request::builder().uri("/").body(Body::empty()).unwrap()
}

#[rstest]
#[tokio::test]
#[serial]
async fn injects_the_toolbar_into_html_responses(
	enabled_config: ToolbarConfig,
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let app = html_app(DebugToolbarLayer::new(enabled_config, connections.0));
	let response = app.oneshot(request()).await.unwrap();
	assert_eq!(response.status(), 200);

	let body = body_text(response).await;
	assert!(body.contains("<h1>users</h1>"));
	assert!(body.contains("grappelli-toolbar"));
	// the toolbar lands inside the document
	let toolbar_at = body.find("grappelli-toolbar").unwrap();
	let body_close_at = body.rfind("</body>").unwrap();
	assert!(toolbar_at < body_close_at);
}

#[rstest]
#[tokio::test]
#[serial]
async fn disabled_toolbar_passes_through(
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let config = ToolbarConfig::new().with_enabled(false);
	let app = html_app(DebugToolbarLayer::new(config, connections.0));
	let body = body_text(app.oneshot(request()).await.unwrap()).await;
	assert_eq!(body, PAGE);
}

#[rstest]
#[tokio::test]
#[serial]
async fn external_clients_pass_through(
	enabled_config: ToolbarConfig,
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let app = html_app(DebugToolbarLayer::new(enabled_config, connections.0));
	let request = Request::builder()
		.uri("/")
		.header("x-forwarded-for", "203.0.113.9")
		.body(Body::empty())
		.unwrap();
	let body = body_text(app.oneshot(request).await.unwrap()).await;
	assert_eq!(body, PAGE);
}

#[rstest]
#[tokio::test]
#[serial]
async fn non_html_responses_are_not_injected(
	enabled_config: ToolbarConfig,
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let app = Router::new()
		.route(
			"/api",
			get(|| async { axum::Json(serde_json::json!({"users": 3})) }),
		)
		.layer(DebugToolbarLayer::new(enabled_config, connections.0));
	let request = Request::builder()
		.uri("/api")
		.body(Body::empty())
		.unwrap();
	let body = body_text(app.oneshot(request).await.unwrap()).await;
	assert_eq!(body, "{\"users\":3}");
}

#[rstest]
#[tokio::test]
#[serial]
async fn panels_run_through_the_whole_lifecycle(
	enabled_config: ToolbarConfig,
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let probe = MockPanel::new("Mock").with_tiny_content("1 M");
	let factory_probe = probe.clone();
	let mut registry = PanelRegistry::new();
	registry.register(move |_deps| Box::new(factory_probe.clone()) as Box<dyn Panel>);

	let layer = DebugToolbarLayer::new(enabled_config, connections.0).with_registry(registry);
	let body = body_text(html_app(layer).oneshot(request()).await.unwrap()).await;

	assert_eq!(probe.process_request_count(), 1);
	assert_eq!(probe.process_view_count(), 1);
	assert_eq!(probe.process_response_count(), 1);
	assert_eq!(probe.content_count(), 1);
	assert!(body.contains("mock-panel"));
	assert!(body.contains("1 M"));
}

#[rstest]
#[tokio::test]
#[serial]
async fn a_failing_panel_hook_surfaces_as_500(
	enabled_config: ToolbarConfig,
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let failing = MockPanel::new("Broken").with_process_request_failure();
	let mut registry = PanelRegistry::new();
	registry.register(move |_deps| Box::new(failing.clone()) as Box<dyn Panel>);

	let layer = DebugToolbarLayer::new(enabled_config, connections.0).with_registry(registry);
	let response = html_app(layer).oneshot(request()).await.unwrap();
	assert_eq!(response.status(), 500);
	let body = body_text(response).await;
	assert!(body.contains("debug toolbar failure"));
}

#[rstest]
#[tokio::test]
#[serial]
async fn validator_diagnostics_appear_in_the_toolbar(
	enabled_config: ToolbarConfig,
	connections: (Arc<ConnectionRegistry>, Arc<QueryLog>),
) {
	let layer = DebugToolbarLayer::new(enabled_config, connections.0).with_validator(Arc::new(
		StubValidator {
			report: "line 1 column 1 - missing doctype\n",
		},
	));
	let body = body_text(html_app(layer).oneshot(request()).await.unwrap()).await;
	assert!(body.contains("Validator (1)"));
	assert!(body.contains("missing doctype"));
}
