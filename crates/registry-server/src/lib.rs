// crates/registry-server/src/lib.rs
// ============================================================================
// Module: Registry Server
// Description: Axum HTTP API for the package registry.
// Purpose: Expose the router builder and the types a binary entry point
//          needs to assemble `AppState` and serve it.
// Dependencies: axum, registry-auth, registry-core, registry-store-sqlite
// ============================================================================

//! ## Overview
//! This crate has no binary-specific concerns of its own (config loading,
//! signal handling) — those live in `main.rs`. Everything here is reusable
//! by an integration test harness that wants an in-process `Router`.

mod error;
mod extract;
mod routes;
mod state;
mod wire;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
