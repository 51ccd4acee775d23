//! Error types for the Tagplay widget.
//!
//! Every error is local to one widget instance. The orchestrator logs it
//! and leaves the instance inert; nothing propagates to sibling widgets.

/// Errors produced while configuring, loading or rendering a widget.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("config error: {0}")]
    Config(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("JS error: {0}")]
    Js(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WidgetError>;
