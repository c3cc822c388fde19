//! # Grappelli
//!
//! A development debug toolbar for Axum applications, inspired by Django
//! Debug Toolbar.
//!
//! Three diagnostic panels observe one request/response cycle each:
//! - **Profiling** — runs the view dispatch under a deterministic
//!   call-graph profiler and lists aggregated call statistics.
//! - **SQL** — shows the queries executed during the request with timing,
//!   keyword-bolded SQL, stack traces and duplicate/N+1 warnings.
//! - **Validator** — feeds HTML responses through an external markup
//!   validator and lists its diagnostics over the (optionally
//!   syntax-highlighted) source.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use grappelli::{DebugToolbarLayer, ToolbarConfig};
//! use grappelli::db::ConnectionRegistry;
//! use std::sync::Arc;
//!
//! let config = ToolbarConfig::new().with_enabled(true);
//! let connections = Arc::new(ConnectionRegistry::new());
//! let queries = connections.register_default(config.query_log_config());
//!
//! let app: Router = Router::new()
//!     .route("/", get(handler))
//!     .layer(DebugToolbarLayer::new(config, connections));
//! ```
//!
//! Database calls are recorded by wrapping them in
//! [`db::QueryLog::observe`]; view code can open extra profiler scopes
//! with [`profiler::scope_current`].
//!
//! ## Architecture
//!
//! 1. **Middleware layer** — request/response interception as a Tower
//!    layer/service pair.
//! 2. **Collaborators** — query logs, the profiler, the markup validator.
//! 3. **Panel layer** — lifecycle hooks and statistics per request.
//! 4. **UI layer** — Tera-rendered fragments injected before `</body>`.
//!
//! The toolbar is configuration-gated: it defaults to debug builds and an
//! internal-IP allowlist, and passes requests through untouched otherwise.

#![warn(missing_docs)]

pub mod context;
pub mod db;
pub mod error;
pub mod middleware;
pub mod panels;
pub mod profiler;
pub mod ui;
pub mod utils;
pub mod validator;

pub use context::{RequestInfo, ResponseInfo, TOOLBAR_CONTEXT, ToolbarContext};
pub use error::{ToolbarError, ToolbarResult};
pub use middleware::{DebugToolbarLayer, DebugToolbarService, ToolbarConfig};
pub use panels::{Panel, PanelRegistry};

pub use panels::profiling::ProfilingPanel;
pub use panels::sql::SqlPanel;
pub use panels::validator::ValidatorPanel;
