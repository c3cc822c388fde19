//! SQL query panel.
//!
//! The query logs are process-wide and cumulative; the panel records their
//! lengths at construction and only ever looks at what was appended since,
//! which makes its view per-request even though the logs are not.

use super::Panel;
use crate::db::{ConnectionRegistry, QueryRecord};
use crate::error::ToolbarResult;
use crate::ui::TemplateRenderer;
use crate::utils::sql_format::{detect_n_plus_one, normalize_sql, reformat_sql};
use crate::utils::stacktrace::Frame;
use crate::utils::template_info::TemplateInfo;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

/// Aggregate numbers for one request, computed once.
#[derive(Debug)]
pub struct SqlStats {
	/// Per-connection query slices appended since the panel's baseline.
	pub databases: BTreeMap<String, Vec<QueryRecord>>,
	/// Sum of all query durations, milliseconds.
	pub sql_time: f64,
	/// Total number of queries.
	pub num_queries: usize,
}

#[derive(Debug, Serialize)]
struct DisplayQuery {
	/// Keyword-bolded, HTML-escaped statement.
	sql: String,
	raw_sql: String,
	params: String,
	duration: f64,
	hash: String,
	width_ratio: f64,
	start_offset: f64,
	is_slow: bool,
	is_select: bool,
	is_duplicate: bool,
	is_n_plus_one: bool,
	stacktrace: Vec<Frame>,
	template_info: Option<TemplateInfo>,
}

#[derive(Serialize)]
struct SqlContext {
	databases: BTreeMap<String, Vec<DisplayQuery>>,
	sql_time: f64,
	num_queries: usize,
}

/// Panel that displays the SQL queries run while processing the request.
pub struct SqlPanel {
	renderer: Arc<TemplateRenderer>,
	connections: Arc<ConnectionRegistry>,
	offsets: HashMap<String, usize>,
	stats: OnceLock<SqlStats>,
}

impl SqlPanel {
	/// Create the panel, taking the current length of every registered
	/// log as this request's baseline.
	pub fn new(renderer: Arc<TemplateRenderer>, connections: Arc<ConnectionRegistry>) -> Self {
		let offsets = connections.offsets();
		Self {
			renderer,
			connections,
			offsets,
			stats: OnceLock::new(),
		}
	}

	/// Compute the per-request stats once; later calls reuse the result.
	pub fn init_stats(&self) -> &SqlStats {
		self.stats.get_or_init(|| {
			let mut databases = BTreeMap::new();
			let mut sql_time = 0.0;
			let mut num_queries = 0;
			for (name, log) in self.connections.all() {
				let offset = self.offsets.get(&name).copied().unwrap_or(0);
				let queries = log.records_since(offset);
				sql_time += queries.iter().map(|q| q.duration).sum::<f64>();
				num_queries += queries.len();
				databases.insert(name, queries);
			}
			SqlStats {
				databases,
				sql_time,
				num_queries,
			}
		})
	}
}

#[async_trait]
impl Panel for SqlPanel {
	fn nav_title(&self) -> String {
		"SQL".to_string()
	}

	fn nav_subtitle(&self) -> String {
		let stats = self.init_stats();
		let noun = if stats.num_queries == 1 {
			"query"
		} else {
			"queries"
		};
		format!("{} {} in {:.2}ms", stats.num_queries, noun, stats.sql_time)
	}

	fn title(&self) -> String {
		"SQL Queries".to_string()
	}

	fn content(&self) -> ToolbarResult<String> {
		let stats = self.init_stats();

		let all: Vec<QueryRecord> = stats.databases.values().flatten().cloned().collect();
		let mut normalized_counts: HashMap<String, usize> = HashMap::new();
		for query in &all {
			*normalized_counts.entry(normalize_sql(&query.sql)).or_insert(0) += 1;
		}
		let n_plus_one = detect_n_plus_one(&all);

		let mut width_ratio_tally = 0.0;
		let mut databases = BTreeMap::new();
		for (name, queries) in &stats.databases {
			let mut rows = Vec::with_capacity(queries.len());
			for query in queries {
				let normalized = normalize_sql(&query.sql);
				let width_ratio = if stats.sql_time > 0.0 {
					(query.duration / stats.sql_time) * 100.0
				} else {
					0.0
				};
				rows.push(DisplayQuery {
					sql: reformat_sql(&query.sql),
					raw_sql: query.raw_sql.clone(),
					params: query.params.clone(),
					duration: query.duration,
					hash: query.hash.clone(),
					width_ratio,
					start_offset: width_ratio_tally,
					is_slow: query.is_slow,
					is_select: query.is_select,
					is_duplicate: normalized_counts[&normalized] > 1,
					is_n_plus_one: n_plus_one.contains(&normalized),
					stacktrace: query.stacktrace.clone(),
					template_info: query.template_info.clone(),
				});
				width_ratio_tally += width_ratio;
			}
			databases.insert(name.clone(), rows);
		}

		self.renderer.render(
			"panels/sql.html",
			&SqlContext {
				databases,
				sql_time: stats.sql_time,
				num_queries: stats.num_queries,
			},
		)
	}

	fn tiny_content(&self) -> Option<String> {
		Some(format!("{} SQL", self.init_stats().num_queries))
	}
}
