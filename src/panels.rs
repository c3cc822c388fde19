//! Panel protocol and implementations.
//!
//! Panels are constructed fresh for every observed request and driven by
//! the middleware through three lifecycle hooks, in order:
//! `process_request` before dispatch, `process_view` around the view
//! future, `process_response` once the response is buffered. The display
//! hooks are read afterwards when the toolbar renders.

pub mod profiling;
pub mod registry;
pub mod sql;
pub mod validator;

pub use profiling::ProfilingPanel;
pub use registry::{PanelDeps, PanelRegistry};
pub use sql::SqlPanel;
pub use validator::ValidatorPanel;

use crate::context::{ResponseInfo, ToolbarContext};
use crate::error::ToolbarResult;
use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use std::pin::Pin;

/// Boxed view-dispatch future threaded through
/// [`Panel::process_view`].
pub type ViewFuture = Pin<Box<dyn Future<Output = Response<Body>> + Send>>;

/// A diagnostic panel bound to one request/response cycle.
///
/// `tiny_content` is the one optional capability: returning `None` (the
/// default) marks the panel as having no one-line summary.
#[async_trait]
pub trait Panel: Send + Sync {
	/// Short name shown on the toolbar handle.
	fn nav_title(&self) -> String;

	/// Subtitle line under the handle; empty by default.
	fn nav_subtitle(&self) -> String {
		String::new()
	}

	/// Heading of the expanded panel.
	fn title(&self) -> String;

	/// Link target for the panel title; empty means no link.
	fn url(&self) -> String {
		String::new()
	}

	/// Called before the view dispatch begins.
	async fn process_request(&mut self, ctx: &ToolbarContext) -> ToolbarResult<()> {
		let _ = ctx;
		Ok(())
	}

	/// Wrap the view-dispatch future; the default leaves it untouched.
	fn process_view(&mut self, ctx: &ToolbarContext, view: ViewFuture) -> ViewFuture {
		let _ = ctx;
		view
	}

	/// Called once the response has been buffered.
	async fn process_response(
		&mut self,
		ctx: &ToolbarContext,
		response: &ResponseInfo,
	) -> ToolbarResult<()> {
		let _ = (ctx, response);
		Ok(())
	}

	/// Rendered panel body.
	fn content(&self) -> ToolbarResult<String>;

	/// Optional one-line summary; `None` marks the capability as absent.
	fn tiny_content(&self) -> Option<String> {
		None
	}
}
