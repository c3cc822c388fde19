//! Test data builders.

use chrono::{DateTime, Utc};
use grappelli::db::QueryRecord;
use grappelli::utils::stacktrace::Frame;
use grappelli::utils::template_info::TemplateInfo;

/// Fluent builder for [`QueryRecord`] test data.
///
/// `is_slow` and `is_select` are derived from the duration and SQL text
/// unless overridden, mirroring what the recorder computes.
#[derive(Debug, Clone)]
pub struct QueryRecordBuilder {
	sql: String,
	raw_sql: Option<String>,
	params: String,
	duration: f64,
	hash: String,
	stacktrace: Vec<Frame>,
	start_time: DateTime<Utc>,
	stop_time: DateTime<Utc>,
	is_slow: Option<bool>,
	is_select: Option<bool>,
	template_info: Option<TemplateInfo>,
	slow_threshold_ms: f64,
}

impl Default for QueryRecordBuilder {
	fn default() -> Self {
		Self {
			sql: "SELECT 1".to_string(),
			raw_sql: None,
			params: String::new(),
			duration: 1.0,
			hash: String::new(),
			stacktrace: Vec::new(),
			start_time: Utc::now(),
			stop_time: Utc::now(),
			is_slow: None,
			is_select: None,
			template_info: None,
			slow_threshold_ms: 500.0,
		}
	}
}

impl QueryRecordBuilder {
	/// Create a builder with defaults.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the SQL text (display and raw forms).
	pub fn sql(mut self, sql: impl Into<String>) -> Self {
		self.sql = sql.into();
		self
	}

	/// Set a raw SQL text differing from the display form.
	pub fn raw_sql(mut self, raw_sql: impl Into<String>) -> Self {
		self.raw_sql = Some(raw_sql.into());
		self
	}

	/// Set the serialized parameters.
	pub fn params(mut self, params: impl Into<String>) -> Self {
		self.params = params.into();
		self
	}

	/// Set the duration in milliseconds.
	pub fn duration_ms(mut self, duration: f64) -> Self {
		self.duration = duration;
		self
	}

	/// Set the fingerprint hash.
	pub fn hash(mut self, hash: impl Into<String>) -> Self {
		self.hash = hash.into();
		self
	}

	/// Set the captured stack trace.
	pub fn stacktrace(mut self, stacktrace: Vec<Frame>) -> Self {
		self.stacktrace = stacktrace;
		self
	}

	/// Override the slow flag instead of deriving it.
	pub fn slow(mut self, is_slow: bool) -> Self {
		self.is_slow = Some(is_slow);
		self
	}

	/// Override the select flag instead of deriving it.
	pub fn select(mut self, is_select: bool) -> Self {
		self.is_select = Some(is_select);
		self
	}

	/// Attach template origin info.
	pub fn template_info(mut self, info: TemplateInfo) -> Self {
		self.template_info = Some(info);
		self
	}

	/// Build the record.
	pub fn build(self) -> QueryRecord {
		let raw_sql = self.raw_sql.unwrap_or_else(|| self.sql.clone());
		QueryRecord {
			is_slow: self
				.is_slow
				.unwrap_or(self.duration > self.slow_threshold_ms),
			is_select: self.is_select.unwrap_or_else(|| {
				raw_sql.trim().to_ascii_lowercase().starts_with("select")
			}),
			sql: self.sql,
			raw_sql,
			params: self.params,
			duration: self.duration,
			hash: self.hash,
			stacktrace: self.stacktrace,
			start_time: self.start_time,
			stop_time: self.stop_time,
			template_info: self.template_info,
		}
	}
}

/// Shorthand for a stack frame.
pub fn frame(file: &str, line: u32, function: &str) -> Frame {
	Frame {
		file: file.to_string(),
		line,
		function: function.to_string(),
		source: None,
	}
}
