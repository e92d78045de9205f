//! HTTP front door: translation requests and avatar control actions.

pub mod routes;

pub use routes::{AppState, api_routes};
