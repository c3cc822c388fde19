//! Toolbar error types.

use thiserror::Error;

/// Result type for toolbar operations.
pub type ToolbarResult<T> = Result<T, ToolbarError>;

/// Errors surfaced by the toolbar and its panels.
///
/// Missing optional collaborators (the `tidy` executable, the `highlight`
/// feature) are not errors; they degrade to empty or fallback output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolbarError {
	/// A panel failed to produce its content.
	#[error("render error: {0}")]
	RenderError(String),

	/// Template engine failure.
	#[error("template error: {0}")]
	Template(#[from] tera::Error),

	/// Response body could not be read or rebuilt.
	#[error("http error: {0}")]
	HttpError(String),

	/// Profile event stream was missing or malformed.
	#[error("profile data error: {0}")]
	ProfileError(String),

	/// Filesystem failure, e.g. on the profiler's temporary file.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
