//! Metagen document metadata service
//!
//! Accepts PDF, DOCX and plain-text uploads and derives keywords, named
//! entities and an extractive summary, exported as JSON and CSV.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::create_router;
pub use state::AppState;
