use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::llm_client::LlmBackend;
use crate::session::store::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmBackend>,
    pub store: Arc<dyn BlobStore>,
    pub config: Config,
    /// Held for the duration of one outbound generation. A second request
    /// arriving while it is held is rejected rather than queued.
    pub generation_slot: Arc<Mutex<()>>,
    /// Serializes read-modify-write cycles on the persisted session blobs.
    pub session_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(llm: Arc<dyn LlmBackend>, store: Arc<dyn BlobStore>, config: Config) -> Self {
        Self {
            llm,
            store,
            config,
            generation_slot: Arc::new(Mutex::new(())),
            session_lock: Arc::new(Mutex::new(())),
        }
    }
}
