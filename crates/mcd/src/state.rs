//! Server state shared by all sessions

use crate::storage::Storage;
use crate::Config;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only server policy plus the session id counter
pub struct ServerState {
    pub config: Config,
    pub storage: Storage,
    next_session_id: AtomicU64,
}

impl ServerState {
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Storage::open(&config.storage.root_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to prepare storage directory {}",
                    config.storage.root_path.display()
                )
            })?;

        Ok(Self {
            config,
            storage,
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Allocate a session id, unique for the life of the process
    pub fn allocate_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Configured AUTH token, if authentication is enabled
    pub fn auth_token(&self) -> Option<&str> {
        self.config.auth_token()
    }

    /// Configured upload ceiling, if any
    pub fn upload_limit(&self) -> Option<u64> {
        self.config.upload_limit()
    }
}
