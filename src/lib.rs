//! tcms - Terminal UI for CMS administration
//!
//! Manages the content blocks, email templates and notification templates
//! behind a CMS admin API, one tab per resource.

pub mod api;
pub mod app;
pub mod config;
pub mod event;
pub mod notification;
pub mod panel;
pub mod resource;
pub mod store;
pub mod ui;

/// Version injected at compile time via TCMS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TCMS_VERSION") {
    Some(v) => v,
    None => "dev",
};
