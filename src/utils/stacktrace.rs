//! Call-stack shaping for the SQL panel.
//!
//! Traces come from the explicit call-context stack in
//! [`crate::context::ToolbarContext`], not from walking the machine stack.
//! Before display they are tidied: frames inside the host framework and the
//! request server are noise, and the innermost frame is always the recorder
//! itself.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{LazyLock, Mutex};

/// One entry of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
	/// Source file path.
	pub file: String,
	/// Line number.
	pub line: u32,
	/// Function or scope name.
	pub function: String,
	/// Source line text, when the instrumentation site supplied it.
	pub source: Option<String>,
}

/// Path rules used by [`tidy_stacktrace`].
///
/// Roots are matched as substrings of the resolved frame path, which covers
/// both in-tree sources and cargo registry checkouts
/// (`…/registry/src/…/tokio-1.x.y/src/…`).
#[derive(Debug, Clone)]
pub struct StackFilter {
	/// Path fragments identifying the host framework's own source tree.
	pub framework_roots: Vec<String>,
	/// Marker segment exempting pluggable apps under a framework root.
	pub contrib_marker: String,
	/// Path fragments identifying the request server / dispatch machinery.
	pub server_roots: Vec<String>,
	/// When false, framework frames are kept (server frames are always
	/// dropped).
	pub hide_framework: bool,
}

impl Default for StackFilter {
	fn default() -> Self {
		Self {
			framework_roots: Vec::new(),
			contrib_marker: "contrib".to_string(),
			server_roots: vec![
				"/tokio-".to_string(),
				"/hyper-".to_string(),
				"/tower-".to_string(),
			],
			hide_framework: true,
		}
	}
}

static REALPATH_CACHE: LazyLock<Mutex<HashMap<String, String>>> =
	LazyLock::new(|| Mutex::new(HashMap::new()));

/// Resolve a path to its canonical form, memoized per process.
///
/// Paths that cannot be resolved (relative `file!()` paths of crates built
/// elsewhere, deleted files) pass through unchanged.
pub fn memoized_realpath(path: &str) -> String {
	let mut cache = REALPATH_CACHE.lock().unwrap();
	if let Some(resolved) = cache.get(path) {
		return resolved.clone();
	}
	let resolved = Path::new(path)
		.canonicalize()
		.map(|p| p.to_string_lossy().into_owned())
		.unwrap_or_else(|_| path.to_string());
	cache.insert(path.to_string(), resolved.clone());
	resolved
}

/// Clean up a captured stack for display.
///
/// Drops every frame whose resolved path lies under a framework root
/// (unless the path contains the contrib marker segment), every frame under
/// a server root, and the final frame, which is the recording code itself.
pub fn tidy_stacktrace(frames: &[Frame], filter: &StackFilter) -> Vec<Frame> {
	let Some(kept) = frames.len().checked_sub(1) else {
		return Vec::new();
	};
	let mut trace = Vec::with_capacity(kept);
	for frame in &frames[..kept] {
		let path = memoized_realpath(&frame.file);
		if filter.hide_framework
			&& filter
				.framework_roots
				.iter()
				.any(|root| path.contains(root.as_str()))
			&& !path.contains(&filter.contrib_marker)
		{
			continue;
		}
		if filter
			.server_roots
			.iter()
			.any(|root| path.contains(root.as_str()))
		{
			continue;
		}
		trace.push(frame.clone());
	}
	trace
}
