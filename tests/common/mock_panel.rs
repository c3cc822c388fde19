//! Configurable mock implementation of the `Panel` trait.

use async_trait::async_trait;
use grappelli::context::{ResponseInfo, ToolbarContext};
use grappelli::error::{ToolbarError, ToolbarResult};
use grappelli::panels::{Panel, ViewFuture};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock panel tracking how its hooks are driven.
///
/// Clones share counters, so a factory can hand instances to the registry
/// while the test keeps a probe.
#[derive(Debug, Clone)]
pub struct MockPanel {
	name: &'static str,
	process_request_count: Arc<AtomicUsize>,
	process_view_count: Arc<AtomicUsize>,
	process_response_count: Arc<AtomicUsize>,
	content_count: Arc<AtomicUsize>,
	fail_process_request: bool,
	fail_content: bool,
	custom_content: Option<String>,
	tiny_content: Option<String>,
}

impl MockPanel {
	/// Create a mock panel with the given display name.
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			process_request_count: Arc::new(AtomicUsize::new(0)),
			process_view_count: Arc::new(AtomicUsize::new(0)),
			process_response_count: Arc::new(AtomicUsize::new(0)),
			content_count: Arc::new(AtomicUsize::new(0)),
			fail_process_request: false,
			fail_content: false,
			custom_content: None,
			tiny_content: None,
		}
	}

	/// Make `process_request` fail.
	pub fn with_process_request_failure(mut self) -> Self {
		self.fail_process_request = true;
		self
	}

	/// Make `content` fail.
	pub fn with_content_failure(mut self) -> Self {
		self.fail_content = true;
		self
	}

	/// Return fixed HTML from `content`.
	pub fn with_custom_content(mut self, html: impl Into<String>) -> Self {
		self.custom_content = Some(html.into());
		self
	}

	/// Give the panel the tiny-content capability.
	pub fn with_tiny_content(mut self, tiny: impl Into<String>) -> Self {
		self.tiny_content = Some(tiny.into());
		self
	}

	/// Number of `process_request` invocations across all clones.
	pub fn process_request_count(&self) -> usize {
		self.process_request_count.load(Ordering::SeqCst)
	}

	/// Number of `process_view` invocations across all clones.
	pub fn process_view_count(&self) -> usize {
		self.process_view_count.load(Ordering::SeqCst)
	}

	/// Number of `process_response` invocations across all clones.
	pub fn process_response_count(&self) -> usize {
		self.process_response_count.load(Ordering::SeqCst)
	}

	/// Number of `content` invocations across all clones.
	pub fn content_count(&self) -> usize {
		self.content_count.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Panel for MockPanel {
	fn nav_title(&self) -> String {
		self.name.to_string()
	}

	fn title(&self) -> String {
		self.name.to_string()
	}

	async fn process_request(&mut self, _ctx: &ToolbarContext) -> ToolbarResult<()> {
		self.process_request_count.fetch_add(1, Ordering::SeqCst);
		if self.fail_process_request {
			return Err(ToolbarError::RenderError(format!(
				"MockPanel '{}' failed in process_request",
				self.name
			)));
		}
		Ok(())
	}

	fn process_view(&mut self, _ctx: &ToolbarContext, view: ViewFuture) -> ViewFuture {
		self.process_view_count.fetch_add(1, Ordering::SeqCst);
		view
	}

	async fn process_response(
		&mut self,
		_ctx: &ToolbarContext,
		_response: &ResponseInfo,
	) -> ToolbarResult<()> {
		self.process_response_count.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	fn content(&self) -> ToolbarResult<String> {
		self.content_count.fetch_add(1, Ordering::SeqCst);
		if self.fail_content {
			return Err(ToolbarError::RenderError(format!(
				"MockPanel '{}' failed to render",
				self.name
			)));
		}
		Ok(self
			.custom_content
			.clone()
			.unwrap_or_else(|| format!("<div class=\"mock-panel\">{}</div>", self.name)))
	}

	fn tiny_content(&self) -> Option<String> {
		self.tiny_content.clone()
	}
}
