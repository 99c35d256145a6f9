//! Gateway server
//!
//! Binds the listener and serves the router.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::{CfgError, Result};
use crate::store::VersionedStore;

use super::routes::router;

/// HTTP gateway over a versioned store
pub struct Gateway {
    listen_addr: String,
    store: Arc<VersionedStore>,
}

impl Gateway {
    /// Create a gateway serving `store` on `listen_addr`.
    pub fn new(listen_addr: impl Into<String>, store: Arc<VersionedStore>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            store,
        }
    }

    /// Bind and serve until the surrounding task is cancelled.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| CfgError::Network(format!("bind {}: {}", self.listen_addr, e)))?;

        tracing::info!("gateway listening on {}", self.listen_addr);

        axum::serve(listener, router(self.store))
            .await
            .map_err(|e| CfgError::Network(e.to_string()))
    }
}
