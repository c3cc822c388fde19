//! Deterministic call-graph profiler.
//!
//! The profiler is bound to a file at construction and streams enter/exit
//! events to it; aggregated statistics are loaded back afterwards with
//! [`stats::ProfileStats::load`]. Only code that is explicitly bracketed is
//! measured: the toolbar brackets the view dispatch, and application code
//! may open further scopes with [`Profiler::scope`].

pub mod stats;

pub use stats::{FuncKey, FuncStats, ProfileStats};

use crate::error::{ToolbarError, ToolbarResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "ev", rename_all = "snake_case")]
pub(crate) enum ProfileEvent {
	Enter {
		file: String,
		line: u32,
		function: String,
		t: u64,
	},
	Exit {
		t: u64,
	},
}

/// A profiler writing its event stream to one file.
#[derive(Debug)]
pub struct Profiler {
	path: PathBuf,
	started: Instant,
	writer: Mutex<Option<BufWriter<File>>>,
}

impl Profiler {
	/// Bind a profiler to `path`, truncating any existing file.
	pub fn new(path: impl AsRef<Path>) -> ToolbarResult<Self> {
		let path = path.as_ref().to_path_buf();
		let writer = BufWriter::new(File::create(&path)?);
		Ok(Self {
			path,
			started: Instant::now(),
			writer: Mutex::new(Some(writer)),
		})
	}

	/// The file this profiler streams to.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn elapsed_ns(&self) -> u64 {
		self.started.elapsed().as_nanos() as u64
	}

	fn write_event(&self, event: &ProfileEvent) -> ToolbarResult<()> {
		let mut guard = self.writer.lock().unwrap();
		let writer = guard.as_mut().ok_or_else(|| {
			ToolbarError::ProfileError("profiler already closed".to_string())
		})?;
		serde_json::to_writer(&mut *writer, event)
			.map_err(|err| ToolbarError::ProfileError(err.to_string()))?;
		writer.write_all(b"\n")?;
		Ok(())
	}

	/// Open a measured scope named `function` at the calling location.
	///
	/// The scope is closed when the returned guard drops.
	#[track_caller]
	pub fn scope(self: &Arc<Self>, function: &str) -> ToolbarResult<ProfilerScope> {
		let location = std::panic::Location::caller();
		self.write_event(&ProfileEvent::Enter {
			file: location.file().to_string(),
			line: location.line(),
			function: function.to_string(),
			t: self.elapsed_ns(),
		})?;
		Ok(ProfilerScope {
			profiler: self.clone(),
		})
	}

	/// Run a future under a root scope named `function`.
	///
	/// Write failures here cannot surface to the response, so they are
	/// logged; loading the stats afterwards reports what was captured.
	#[track_caller]
	pub fn runcall<F>(
		self: Arc<Self>,
		function: &str,
		fut: F,
	) -> impl Future<Output = F::Output>
	where
		F: Future,
	{
		let location = std::panic::Location::caller();
		let enter = ProfileEvent::Enter {
			file: location.file().to_string(),
			line: location.line(),
			function: function.to_string(),
			t: self.elapsed_ns(),
		};
		async move {
			if let Err(err) = self.write_event(&enter) {
				tracing::error!(error = %err, "failed to record profiler enter");
			}
			let output = fut.await;
			let t = self.elapsed_ns();
			if let Err(err) = self.write_event(&ProfileEvent::Exit { t }) {
				tracing::error!(error = %err, "failed to record profiler exit");
			}
			output
		}
	}

	/// Flush and release the event stream.
	pub fn close(&self) -> ToolbarResult<()> {
		if let Some(mut writer) = self.writer.lock().unwrap().take() {
			writer.flush()?;
		}
		Ok(())
	}
}

/// Guard for one open profiler scope.
#[must_use = "the scope is closed when the guard is dropped"]
pub struct ProfilerScope {
	profiler: Arc<Profiler>,
}

impl Drop for ProfilerScope {
	fn drop(&mut self) {
		let t = self.profiler.elapsed_ns();
		if let Err(err) = self.profiler.write_event(&ProfileEvent::Exit { t }) {
			tracing::warn!(error = %err, "failed to record profiler exit");
		}
	}
}

/// Open a scope on the active request's profiler.
///
/// Returns `None` when no toolbar context is installed or the profiling
/// panel is not running; application instrumentation stays a no-op outside
/// observed requests.
#[track_caller]
pub fn scope_current(function: &str) -> Option<ProfilerScope> {
	let ctx = crate::context::ToolbarContext::current()?;
	let profiler = ctx.profiler()?;
	match profiler.scope(function) {
		Ok(scope) => Some(scope),
		Err(err) => {
			tracing::warn!(error = %err, "failed to open profiler scope");
			None
		}
	}
}
