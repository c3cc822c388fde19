//! Toolbar configuration.

use crate::db::QueryLogConfig;
use crate::utils::stacktrace::StackFilter;
use std::net::IpAddr;

/// Settings for the debug toolbar.
///
/// # Examples
///
/// ```
/// use grappelli::middleware::ToolbarConfig;
///
/// let config = ToolbarConfig::new()
///     .with_secret_key("dev-secret")
///     .with_sql_warning_threshold(250.0);
/// assert_eq!(config.sql_warning_threshold_ms, 250.0);
/// ```
#[derive(Debug, Clone)]
pub struct ToolbarConfig {
	/// Whether the toolbar runs at all. Defaults to debug builds only.
	pub enabled: bool,
	/// Client addresses allowed to see the toolbar.
	pub internal_ips: Vec<IpAddr>,
	/// Threshold above which a query counts as slow, in milliseconds.
	pub sql_warning_threshold_ms: f64,
	/// Whether framework-internal frames are hidden from SQL stack
	/// traces.
	pub hide_framework_sql: bool,
	/// Path fragments identifying the host framework's source tree.
	pub framework_roots: Vec<String>,
	/// Marker segment exempting pluggable apps from framework hiding.
	pub contrib_marker: String,
	/// Path fragments identifying the request server / dispatch
	/// machinery.
	pub server_roots: Vec<String>,
	/// Secret mixed into statement fingerprints.
	pub secret_key: String,
}

impl Default for ToolbarConfig {
	fn default() -> Self {
		let default_filter = StackFilter::default();
		Self {
			enabled: cfg!(debug_assertions),
			internal_ips: vec!["127.0.0.1".parse().unwrap(), "::1".parse().unwrap()],
			sql_warning_threshold_ms: 500.0,
			hide_framework_sql: true,
			framework_roots: Vec::new(),
			contrib_marker: default_filter.contrib_marker,
			server_roots: default_filter.server_roots,
			secret_key: String::new(),
		}
	}
}

impl ToolbarConfig {
	/// Create a configuration with the defaults.
	pub fn new() -> Self {
		Self::default()
	}

	/// Force the toolbar on or off regardless of build profile.
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// Replace the internal-IP allowlist.
	pub fn with_internal_ips(mut self, ips: Vec<IpAddr>) -> Self {
		self.internal_ips = ips;
		self
	}

	/// Set the slow-query threshold in milliseconds.
	pub fn with_sql_warning_threshold(mut self, threshold_ms: f64) -> Self {
		self.sql_warning_threshold_ms = threshold_ms;
		self
	}

	/// Set the fingerprint secret.
	pub fn with_secret_key(mut self, secret: impl Into<String>) -> Self {
		self.secret_key = secret.into();
		self
	}

	/// Add a framework source root to hide from SQL stack traces.
	pub fn with_framework_root(mut self, root: impl Into<String>) -> Self {
		self.framework_roots.push(root.into());
		self
	}

	/// Add a server/dispatch source root to hide from SQL stack traces.
	pub fn with_server_root(mut self, root: impl Into<String>) -> Self {
		self.server_roots.push(root.into());
		self
	}

	/// Stack filter derived from these settings.
	pub fn stack_filter(&self) -> StackFilter {
		StackFilter {
			framework_roots: self.framework_roots.clone(),
			contrib_marker: self.contrib_marker.clone(),
			server_roots: self.server_roots.clone(),
			hide_framework: self.hide_framework_sql,
		}
	}

	/// Query-log settings derived from these settings, for hosts that
	/// build their logs from the toolbar configuration.
	pub fn query_log_config(&self) -> QueryLogConfig {
		QueryLogConfig {
			secret: self.secret_key.clone(),
			slow_threshold_ms: self.sql_warning_threshold_ms,
			stack_filter: self.stack_filter(),
		}
	}

	/// Whether `client_ip` is allowed to see the toolbar.
	pub fn is_internal_ip(&self, client_ip: &str) -> bool {
		client_ip
			.parse::<IpAddr>()
			.map(|ip| self.internal_ips.contains(&ip))
			.unwrap_or(false)
	}
}
