//! Blueskid Ledger Server
//!
//! Serves the assertion protocol over HTTP: generates assertions for users to
//! post, reads posted assertions back from social platforms and records the
//! resulting claims, grants and unclaims in the identity ledger.

pub mod adapters;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ServerError;
pub use state::AppState;
