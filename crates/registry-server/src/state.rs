// crates/registry-server/src/state.rs
// ============================================================================
// Module: Application State
// Description: The services every route handler is built against.
// Purpose: One small `Clone`-able handle threaded through the router.
// ============================================================================

use std::sync::Arc;

use registry_auth::TokenCodec;
use registry_store_sqlite::SqliteStore;

/// Shared services available to every route handler.
///
/// Cloning is cheap: every field is an `Arc`. The token codec is stored as
/// a trait object so tests can swap in a codec seeded with a throwaway
/// secret without touching the router.
#[derive(Clone)]
pub struct AppState {
    /// The registry's persistence layer.
    pub store: Arc<SqliteStore>,
    /// Bearer token mint/verify.
    pub token_codec: Arc<dyn TokenCodec>,
    /// How long a freshly minted token stays valid.
    pub token_expiry_seconds: u64,
    /// The role name granted to a namespace's creator.
    pub default_namespace_owner_role: String,
}
