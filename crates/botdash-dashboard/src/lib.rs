//! botdash dashboard: report proxy backend, server-rendered report view
//! and terminal report viewer around the botdash report controller.

pub mod artifacts;
pub mod config;
pub mod report_console;
pub mod upstream;
pub mod web_server;

pub use config::{ConfigError, DashboardConfig, LogSourceConfig, ServerConfig};
pub use upstream::{InProcessSource, LogSourceSummary, ProxyReply, ReportProxy};
pub use web_server::WebServer;
