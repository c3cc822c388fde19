//! Query recording collaborators for the SQL panel.
//!
//! The host application owns one [`QueryLog`] per named connection and
//! wraps every statement execution in [`QueryLog::observe`]; the SQL panel
//! only ever reads a suffix of the resulting log. The log is explicitly
//! injected and lives as long as the connection that owns it — in a
//! long-lived process the log grows for the connection's whole lifetime.

use crate::context::ToolbarContext;
use crate::utils::stacktrace::{Frame, StackFilter, tidy_stacktrace};
use crate::utils::template_info::{TemplateInfo, template_info};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Name of the implicit single connection.
pub const DEFAULT_CONNECTION: &str = "default";

/// Milliseconds from a wall-clock duration.
pub fn ms_from_duration(duration: Duration) -> f64 {
	duration.as_secs_f64() * 1000.0
}

/// Stable statement fingerprint: SHA-256 over the process secret, the raw
/// SQL and the serialized parameters. Identical inputs always hash alike,
/// which allows correlating the same statement across requests.
pub fn fingerprint(secret: &str, raw_sql: &str, params: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(secret.as_bytes());
	hasher.update(raw_sql.as_bytes());
	hasher.update(params.as_bytes());
	hex::encode(hasher.finalize())
}

/// One executed statement, captured by [`QueryLog::observe`].
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
	/// Display form of the statement (raw SQL annotated with parameters).
	pub sql: String,
	/// The statement exactly as submitted.
	pub raw_sql: String,
	/// Bound parameters serialized as JSON; empty when serialization
	/// failed.
	pub params: String,
	/// Wall-clock duration in milliseconds.
	pub duration: f64,
	/// Statement fingerprint, see [`fingerprint`].
	pub hash: String,
	/// Tidied call stack at execution time.
	pub stacktrace: Vec<Frame>,
	/// When execution started.
	pub start_time: DateTime<Utc>,
	/// When execution finished.
	pub stop_time: DateTime<Utc>,
	/// Whether the duration exceeded the slow-query threshold.
	pub is_slow: bool,
	/// Whether the trimmed, lowercased statement starts with `select`.
	pub is_select: bool,
	/// Template source the statement was issued from, when known.
	pub template_info: Option<TemplateInfo>,
}

/// Settings for one [`QueryLog`].
#[derive(Debug, Clone)]
pub struct QueryLogConfig {
	/// Secret mixed into statement fingerprints.
	pub secret: String,
	/// Threshold above which a query counts as slow, in milliseconds.
	pub slow_threshold_ms: f64,
	/// Stack filter applied to captured call stacks.
	pub stack_filter: StackFilter,
}

impl Default for QueryLogConfig {
	fn default() -> Self {
		Self {
			secret: String::new(),
			slow_threshold_ms: 500.0,
			stack_filter: StackFilter::default(),
		}
	}
}

/// Append-only log of executed statements for one connection.
#[derive(Debug)]
pub struct QueryLog {
	config: QueryLogConfig,
	records: Mutex<Vec<QueryRecord>>,
}

impl QueryLog {
	/// Create an empty log.
	pub fn new(config: QueryLogConfig) -> Self {
		Self {
			config,
			records: Mutex::new(Vec::new()),
		}
	}

	/// Number of recorded statements.
	pub fn len(&self) -> usize {
		self.records.lock().unwrap().len()
	}

	/// Whether nothing has been recorded yet.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Copy of the whole log.
	pub fn records(&self) -> Vec<QueryRecord> {
		self.records.lock().unwrap().clone()
	}

	/// Copy of the records appended at or after `offset`.
	///
	/// The offset is clamped, so a log shorter than a previously taken
	/// baseline yields an empty slice.
	pub fn records_since(&self, offset: usize) -> Vec<QueryRecord> {
		let records = self.records.lock().unwrap();
		let offset = offset.min(records.len());
		records[offset..].to_vec()
	}

	/// Append an already-built record. Instrumentation normally goes
	/// through [`observe`](Self::observe) instead.
	pub fn push(&self, record: QueryRecord) {
		self.records.lock().unwrap().push(record);
	}

	/// Execute `exec` as the statement `sql` with `params`, recording the
	/// outcome.
	///
	/// The record is appended whether the execution succeeds or fails:
	/// duration, tidied call stack, template origin (from the active
	/// render scope, if any), parameter JSON and fingerprint. Parameters
	/// that cannot be serialized leave the field empty.
	#[track_caller]
	pub fn observe<P, F, T, E>(&self, sql: &str, params: &P, exec: F) -> impl Future<Output = Result<T, E>>
	where
		P: Serialize + ?Sized,
		F: Future<Output = Result<T, E>>,
	{
		let location = std::panic::Location::caller();
		let own_frame = Frame {
			file: location.file().to_string(),
			line: location.line(),
			function: "QueryLog::observe".to_string(),
			source: None,
		};
		let params_json = match serde_json::to_string(params) {
			Ok(json) => json,
			Err(err) => {
				tracing::debug!(error = %err, "query parameters not serializable");
				String::new()
			}
		};
		let sql = sql.to_string();
		async move {
			let started = Instant::now();
			let start_time = Utc::now();
			let result = exec.await;
			let stop_time = Utc::now();
			let duration = ms_from_duration(started.elapsed());
			self.record(&sql, params_json, own_frame, start_time, stop_time, duration);
			result
		}
	}

	fn record(
		&self,
		raw_sql: &str,
		params: String,
		own_frame: Frame,
		start_time: DateTime<Utc>,
		stop_time: DateTime<Utc>,
		duration: f64,
	) {
		let context = ToolbarContext::current();
		let stacktrace = match &context {
			Some(ctx) => {
				let mut frames = ctx.snapshot_stack();
				frames.push(own_frame);
				tidy_stacktrace(&frames, &self.config.stack_filter)
			}
			None => Vec::new(),
		};
		let template_origin = context.as_ref().and_then(|ctx| ctx.current_render());

		let display_sql = if params.is_empty() || params == "[]" {
			raw_sql.to_string()
		} else {
			format!("{raw_sql} -- params: {params}")
		};
		let hash = fingerprint(&self.config.secret, raw_sql, &params);

		let record = QueryRecord {
			sql: display_sql,
			raw_sql: raw_sql.to_string(),
			hash,
			stacktrace,
			start_time,
			stop_time,
			is_slow: duration > self.config.slow_threshold_ms,
			is_select: raw_sql.trim().to_ascii_lowercase().starts_with("select"),
			template_info: template_origin.map(|origin| template_info(&origin, 3)),
			params,
			duration,
		};
		tracing::trace!(duration_ms = duration, "recorded query");
		self.records.lock().unwrap().push(record);
	}
}

/// Named-connection registry handed to the toolbar.
///
/// The application registers one log per connection; the SQL panel takes
/// per-connection baselines from it at construction time.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
	logs: RwLock<HashMap<String, Arc<QueryLog>>>,
}

impl ConnectionRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `log` under `name`, replacing any previous log.
	pub fn register(&self, name: impl Into<String>, log: Arc<QueryLog>) {
		self.logs.write().unwrap().insert(name.into(), log);
	}

	/// Create, register and return a log for the
	/// [`DEFAULT_CONNECTION`].
	pub fn register_default(&self, config: QueryLogConfig) -> Arc<QueryLog> {
		let log = Arc::new(QueryLog::new(config));
		self.register(DEFAULT_CONNECTION, log.clone());
		log
	}

	/// Log registered under `name`, if any.
	pub fn get(&self, name: &str) -> Option<Arc<QueryLog>> {
		self.logs.read().unwrap().get(name).cloned()
	}

	/// Snapshot of all registered logs.
	pub fn all(&self) -> HashMap<String, Arc<QueryLog>> {
		self.logs.read().unwrap().clone()
	}

	/// Current length of every registered log, keyed by connection name.
	pub fn offsets(&self) -> HashMap<String, usize> {
		self.logs
			.read()
			.unwrap()
			.iter()
			.map(|(name, log)| (name.clone(), log.len()))
			.collect()
	}
}
