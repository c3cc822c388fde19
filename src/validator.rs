//! External markup validation.
//!
//! The validator is an injected collaborator; the default implementation
//! runs the native HTML Tidy executable and hands back its diagnostic
//! stream. A missing executable is not an error — validation silently
//! reports nothing, matching the behavior of an optional dependency.

use crate::error::ToolbarResult;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

static ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"line (?P<line>\d+) column (?P<column>\d+) - (?P<message>.*)\n").unwrap()
});

/// One diagnostic parsed from the validator's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
	/// Line number, as printed by the validator.
	pub line: String,
	/// Column number, as printed by the validator.
	pub column: String,
	/// Diagnostic text.
	pub message: String,
}

/// Parse a diagnostic stream with the fixed
/// `line N column M - message` grammar.
pub fn parse_report(report: &str) -> Vec<ValidationError> {
	ERROR_RE
		.captures_iter(report)
		.map(|caps| ValidationError {
			line: caps["line"].to_string(),
			column: caps["column"].to_string(),
			message: caps["message"].to_string(),
		})
		.collect()
}

/// A markup validator producing a raw diagnostic stream.
pub trait MarkupValidator: Send + Sync {
	/// Validate `source` and return the diagnostic text, empty when the
	/// validator is unavailable or found nothing.
	fn validate(&self, source: &str) -> ToolbarResult<String>;
}

/// Default validator: the native `tidy` executable.
#[derive(Debug, Clone)]
pub struct TidyValidator {
	program: String,
}

impl TidyValidator {
	/// Validator invoking `tidy` from `PATH`.
	pub fn new() -> Self {
		Self {
			program: "tidy".to_string(),
		}
	}

	/// Validator invoking a specific executable.
	pub fn with_program(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
		}
	}
}

impl Default for TidyValidator {
	fn default() -> Self {
		Self::new()
	}
}

impl MarkupValidator for TidyValidator {
	fn validate(&self, source: &str) -> ToolbarResult<String> {
		let mut child = match Command::new(&self.program)
			.args(["-errors", "-quiet", "--numeric-entities", "yes"])
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.spawn()
		{
			Ok(child) => child,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(program = %self.program, "markup validator not installed");
				return Ok(String::new());
			}
			Err(err) => return Err(err.into()),
		};

		if let Some(stdin) = child.stdin.take() {
			let mut stdin = stdin;
			// tidy may close its input early on large documents
			let _ = stdin.write_all(source.as_bytes());
		}
		let output = child.wait_with_output()?;
		Ok(String::from_utf8_lossy(&output.stderr).into_owned())
	}
}
