//! Aria CLI - headless front end for the music service
//!
//! Exposes the configuration loader and the [`App`](app::App) wiring so the
//! binary and integration tests share one code path.

pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::AppConfig;
pub use error::{CliError, Result};
