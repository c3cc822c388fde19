//! Middleware components.
//!
//! Tower layer and service hosting the panels: they intercept a request,
//! drive each panel through its lifecycle hooks and inject the rendered
//! toolbar into HTML responses.

pub mod config;
pub mod layer;
pub mod service;

pub use config::ToolbarConfig;
pub use layer::DebugToolbarLayer;
pub use service::DebugToolbarService;
