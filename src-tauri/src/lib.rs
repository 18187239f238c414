pub mod app;
pub mod auth;
pub mod board;
pub mod clock;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod instances;
pub mod model;
pub mod progress;
pub mod reply;
pub mod storage;
pub mod templates;

#[cfg(feature = "desktop")]
mod commands;

pub use app::AuditTracker;
pub use error::{AuditError, AuthError, Result};
pub use progress::calculate_progress;

#[cfg(feature = "desktop")]
pub use commands::run;
