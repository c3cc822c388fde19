//! Per-request toolbar context.
//!
//! A [`ToolbarContext`] is created by the middleware for every observed
//! request and made available to instrumented code through a Tokio
//! task-local. It carries the request description plus two explicit scope
//! stacks: the call-context stack (stands in for machine stack traces) and
//! the template-render stack (stands in for locating the enclosing template
//! by frame inspection).

use crate::profiler::Profiler;
use crate::utils::stacktrace::Frame;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

tokio::task_local! {
	/// Ambient toolbar context for the request currently being served.
	pub static TOOLBAR_CONTEXT: Arc<ToolbarContext>;
}

/// Request description captured when the toolbar middleware runs.
#[derive(Debug, Clone)]
pub struct RequestInfo {
	/// HTTP method.
	pub method: String,
	/// Request path.
	pub path: String,
	/// Raw query string, if any.
	pub query: Option<String>,
	/// Request headers as name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Client IP as reported by the connection or forwarding headers.
	pub client_ip: String,
	/// Time the request entered the middleware.
	pub timestamp: DateTime<Utc>,
}

/// Buffered response description handed to `process_response`.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
	/// HTTP status code.
	pub status: u16,
	/// Response headers as name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Declared `Content-Type`, if any.
	pub content_type: Option<String>,
	/// Response body decoded as text.
	pub body: String,
}

/// Source span of a template being rendered, pushed by [`RenderScope`].
#[derive(Debug, Clone)]
pub struct TemplateOrigin {
	/// Template name as known to the renderer.
	pub name: String,
	/// Full template source.
	pub source: Arc<str>,
	/// Byte span of the node currently rendering.
	pub span: (usize, usize),
}

/// Per-request state shared between the middleware, the panels and any
/// instrumented application code.
#[derive(Debug)]
pub struct ToolbarContext {
	/// The request being observed.
	pub request: RequestInfo,
	call_stack: Mutex<Vec<Frame>>,
	render_stack: Mutex<Vec<TemplateOrigin>>,
	profiler: Mutex<Option<Arc<Profiler>>>,
}

impl ToolbarContext {
	/// Create a context for one request.
	pub fn new(request: RequestInfo) -> Self {
		Self {
			request,
			call_stack: Mutex::new(Vec::new()),
			render_stack: Mutex::new(Vec::new()),
			profiler: Mutex::new(None),
		}
	}

	/// The context of the request currently being served, if the toolbar
	/// middleware is active on this task.
	pub fn current() -> Option<Arc<ToolbarContext>> {
		TOOLBAR_CONTEXT.try_with(Arc::clone).ok()
	}

	/// Snapshot of the explicit call-context stack, outermost first.
	pub fn snapshot_stack(&self) -> Vec<Frame> {
		self.call_stack.lock().unwrap().clone()
	}

	/// Innermost template-render scope, if one is active.
	pub fn current_render(&self) -> Option<TemplateOrigin> {
		self.render_stack.lock().unwrap().last().cloned()
	}

	/// Attach the request's profiler so instrumented code can open scopes.
	pub fn set_profiler(&self, profiler: Arc<Profiler>) {
		*self.profiler.lock().unwrap() = Some(profiler);
	}

	/// The request's profiler, when the profiling panel is active.
	pub fn profiler(&self) -> Option<Arc<Profiler>> {
		self.profiler.lock().unwrap().clone()
	}

	fn push_frame(&self, frame: Frame) {
		self.call_stack.lock().unwrap().push(frame);
	}

	fn pop_frame(&self) {
		self.call_stack.lock().unwrap().pop();
	}

	fn push_render(&self, origin: TemplateOrigin) {
		self.render_stack.lock().unwrap().push(origin);
	}

	fn pop_render(&self) {
		self.render_stack.lock().unwrap().pop();
	}
}

/// Run `fut` with `ctx` installed as the ambient toolbar context.
pub async fn scope<F>(ctx: Arc<ToolbarContext>, fut: F) -> F::Output
where
	F: Future,
{
	TOOLBAR_CONTEXT.scope(ctx, fut).await
}

/// Guard for one entry on the call-context stack.
///
/// Created by [`enter_frame`]; pops its frame when dropped. A guard created
/// outside an active toolbar context is a no-op.
#[must_use = "the frame is popped when the guard is dropped"]
pub struct CallScope {
	ctx: Option<Arc<ToolbarContext>>,
}

impl Drop for CallScope {
	fn drop(&mut self) {
		if let Some(ctx) = &self.ctx {
			ctx.pop_frame();
		}
	}
}

/// Push a call frame for the calling location.
///
/// Instrumented code brackets interesting spans (view bodies, service
/// helpers) with this; the SQL recorder snapshots the resulting stack when
/// a statement executes.
#[track_caller]
pub fn enter_frame(function: &str) -> CallScope {
	let location = std::panic::Location::caller();
	match ToolbarContext::current() {
		Some(ctx) => {
			ctx.push_frame(Frame {
				file: location.file().to_string(),
				line: location.line(),
				function: function.to_string(),
				source: None,
			});
			CallScope { ctx: Some(ctx) }
		}
		None => CallScope { ctx: None },
	}
}

/// Guard for one entry on the template-render stack.
#[must_use = "the render scope is popped when the guard is dropped"]
pub struct RenderScope {
	ctx: Option<Arc<ToolbarContext>>,
}

impl Drop for RenderScope {
	fn drop(&mut self) {
		if let Some(ctx) = &self.ctx {
			ctx.pop_render();
		}
	}
}

/// Mark a template node as currently rendering.
///
/// Template integrations call this around node evaluation so the SQL
/// recorder can attribute queries to the template source that issued them.
pub fn enter_render(origin: TemplateOrigin) -> RenderScope {
	match ToolbarContext::current() {
		Some(ctx) => {
			ctx.push_render(origin);
			RenderScope { ctx: Some(ctx) }
		}
		None => RenderScope { ctx: None },
	}
}
