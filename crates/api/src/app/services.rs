use std::sync::Arc;

use comercio_auth::TokenService;
use comercio_store::Store;

/// Service bundle injected into handlers via `Extension`.
///
/// The store is a trait object so the same router runs over Postgres in
/// production and over the in-memory store in tests.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }
}
