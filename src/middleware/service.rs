//! Debug toolbar Tower service.

use crate::context::{self, RequestInfo, ResponseInfo, ToolbarContext};
use crate::db::ConnectionRegistry;
use crate::error::ToolbarError;
use crate::middleware::ToolbarConfig;
use crate::panels::{PanelDeps, PanelRegistry, ViewFuture};
use crate::ui::{TemplateRenderer, inject_toolbar, render_toolbar};
use crate::validator::MarkupValidator;
use axum::body::Body;
use axum::response::Response;
use chrono::Utc;
use http::Request;
use http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use tower::Service;

/// Service produced by
/// [`DebugToolbarLayer`](crate::middleware::DebugToolbarLayer).
///
/// For observed requests it instantiates fresh panels, drives
/// `process_request` → `process_view` → `process_response` in that order,
/// then renders and injects the toolbar. Disabled configurations and
/// external clients pass straight through to the inner service.
#[derive(Clone)]
pub struct DebugToolbarService<S> {
	pub(crate) inner: S,
	pub(crate) config: Arc<ToolbarConfig>,
	pub(crate) registry: Arc<PanelRegistry>,
	pub(crate) connections: Arc<ConnectionRegistry>,
	pub(crate) renderer: Arc<TemplateRenderer>,
	pub(crate) validator: Arc<dyn MarkupValidator>,
}

impl<S> Service<Request<Body>> for DebugToolbarService<S>
where
	S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = Response;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

	fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);

		let client_ip = client_ip(&req);
		if !self.config.enabled || !self.config.is_internal_ip(&client_ip) {
			return Box::pin(inner.call(req));
		}

		let config = self.config.clone();
		let registry = self.registry.clone();
		let connections = self.connections.clone();
		let renderer = self.renderer.clone();
		let validator = self.validator.clone();

		Box::pin(async move {
			let request_info = request_info(&req, client_ip);
			tracing::debug!(
				method = %request_info.method,
				path = %request_info.path,
				"debug toolbar observing request"
			);
			let ctx = Arc::new(ToolbarContext::new(request_info));

			let deps = PanelDeps {
				config,
				connections,
				renderer: renderer.clone(),
				validator,
			};
			let mut panels = registry.instantiate(&deps);

			for panel in panels.iter_mut() {
				if let Err(err) = panel.process_request(&ctx).await {
					return Ok(toolbar_failure(err));
				}
			}

			let inner_call = context::scope(ctx.clone(), inner.call(req));
			let mut view: ViewFuture = Box::pin(async move {
				match inner_call.await {
					Ok(response) => response,
					Err(never) => match never {},
				}
			});
			for panel in panels.iter_mut() {
				view = panel.process_view(&ctx, view);
			}
			let response = view.await;

			let (parts, body) = response.into_parts();
			let bytes = match body.collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(err) => {
					return Ok(toolbar_failure(ToolbarError::HttpError(err.to_string())));
				}
			};
			let body_string = String::from_utf8_lossy(&bytes).into_owned();
			let response_info = response_info(&parts, body_string.clone());

			for panel in panels.iter_mut() {
				if let Err(err) = panel.process_response(&ctx, &response_info).await {
					return Ok(toolbar_failure(err));
				}
			}

			let toolbar_html = match render_toolbar(&renderer, &panels) {
				Ok(html) => html,
				Err(err) => return Ok(toolbar_failure(err)),
			};

			Ok(inject_toolbar(parts, body_string, &toolbar_html))
		})
	}
}

fn client_ip(req: &Request<Body>) -> String {
	if let Some(forwarded) = req
		.headers()
		.get("x-forwarded-for")
		.and_then(|value| value.to_str().ok())
		&& let Some(first) = forwarded.split(',').next()
	{
		return first.trim().to_string();
	}
	req.extensions()
		.get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
		.map(|info| info.0.ip().to_string())
		.unwrap_or_else(|| "127.0.0.1".to_string())
}

fn request_info(req: &Request<Body>, client_ip: String) -> RequestInfo {
	RequestInfo {
		method: req.method().to_string(),
		path: req.uri().path().to_string(),
		query: req.uri().query().map(str::to_string),
		headers: req
			.headers()
			.iter()
			.map(|(name, value)| {
				(
					name.to_string(),
					String::from_utf8_lossy(value.as_bytes()).into_owned(),
				)
			})
			.collect(),
		client_ip,
		timestamp: Utc::now(),
	}
}

fn response_info(parts: &http::response::Parts, body: String) -> ResponseInfo {
	ResponseInfo {
		status: parts.status.as_u16(),
		headers: parts
			.headers
			.iter()
			.map(|(name, value)| {
				(
					name.to_string(),
					String::from_utf8_lossy(value.as_bytes()).into_owned(),
				)
			})
			.collect(),
		content_type: parts
			.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(str::to_string),
		body,
	}
}

/// A development-only tool surfaces its own breakage instead of hiding it.
fn toolbar_failure(err: ToolbarError) -> Response {
	tracing::error!(error = %err, "debug toolbar failure");
	http::Response::builder()
		.status(http::StatusCode::INTERNAL_SERVER_ERROR)
		.header(CONTENT_TYPE, "text/plain; charset=utf-8")
		.body(Body::from(format!("debug toolbar failure: {err}")))
		.unwrap()
}
