//! Function-call profiling panel.
//!
//! Only the view dispatch runs under the profiler; middleware before and
//! after it is not measured.

use super::{Panel, ViewFuture};
use crate::context::{ResponseInfo, ToolbarContext};
use crate::error::ToolbarResult;
use crate::profiler::{ProfileStats, Profiler};
use crate::ui::TemplateRenderer;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Fixed-width seconds for the profile table.
fn f8(seconds: f64) -> String {
	format!("{seconds:8.3}")
}

#[derive(Debug, Clone, Serialize)]
struct ProfileRow {
	calls: u64,
	primitive_calls: u64,
	total_time: String,
	cumulative_time: String,
	function: String,
	file: String,
	line: u32,
}

#[derive(Serialize)]
struct ProfilingContext<'a> {
	rows: &'a [ProfileRow],
	total_calls: u64,
}

/// Panel that profiles the view dispatch of one request.
pub struct ProfilingPanel {
	renderer: Arc<TemplateRenderer>,
	tmpfile: Option<NamedTempFile>,
	profiler: Option<Arc<Profiler>>,
	stats: Option<ProfileStats>,
	rows: Vec<ProfileRow>,
}

impl ProfilingPanel {
	/// Create the panel for one request.
	pub fn new(renderer: Arc<TemplateRenderer>) -> Self {
		Self {
			renderer,
			tmpfile: None,
			profiler: None,
			stats: None,
			rows: Vec::new(),
		}
	}

	/// Loaded statistics, available after `process_response`.
	pub fn stats(&self) -> Option<&ProfileStats> {
		self.stats.as_ref()
	}
}

#[async_trait]
impl Panel for ProfilingPanel {
	fn nav_title(&self) -> String {
		"Profiling".to_string()
	}

	fn nav_subtitle(&self) -> String {
		let total = self.stats.as_ref().map(ProfileStats::total_calls).unwrap_or(0);
		format!("{total} function calls")
	}

	fn title(&self) -> String {
		"Profiling".to_string()
	}

	async fn process_request(&mut self, ctx: &ToolbarContext) -> ToolbarResult<()> {
		let tmpfile = NamedTempFile::new()?;
		let profiler = Arc::new(Profiler::new(tmpfile.path())?);
		ctx.set_profiler(profiler.clone());
		self.profiler = Some(profiler);
		self.tmpfile = Some(tmpfile);
		Ok(())
	}

	fn process_view(&mut self, _ctx: &ToolbarContext, view: ViewFuture) -> ViewFuture {
		match &self.profiler {
			Some(profiler) => Box::pin(profiler.clone().runcall("view", view)),
			None => view,
		}
	}

	async fn process_response(
		&mut self,
		_ctx: &ToolbarContext,
		_response: &ResponseInfo,
	) -> ToolbarResult<()> {
		let Some(profiler) = self.profiler.take() else {
			return Ok(());
		};
		profiler.close()?;
		let Some(tmpfile) = self.tmpfile.take() else {
			return Ok(());
		};
		let stats = ProfileStats::load(tmpfile.path())?;
		// tmpfile drops here, discarding the event stream

		self.rows = stats
			.sorted_by_cumulative()
			.into_iter()
			.map(|(key, func)| ProfileRow {
				calls: func.calls,
				primitive_calls: func.primitive_calls,
				total_time: f8(func.total_time.as_secs_f64()),
				cumulative_time: f8(func.cumulative_time.as_secs_f64()),
				function: key.function.clone(),
				file: key.file.clone(),
				line: key.line,
			})
			.collect();
		self.stats = Some(stats);
		Ok(())
	}

	fn content(&self) -> ToolbarResult<String> {
		self.renderer.render(
			"panels/profiling.html",
			&ProfilingContext {
				rows: &self.rows,
				total_calls: self.stats.as_ref().map(ProfileStats::total_calls).unwrap_or(0),
			},
		)
	}
}
