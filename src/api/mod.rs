//! HTTP API for the orchestrator.
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check
//! - `GET /provider` - Current provider and model
//! - `POST /generate` - Generate a completion
//! - `POST /chat` - Alias of `/generate`

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
