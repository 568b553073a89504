mod connection;
pub mod registry;
mod store;

use crate::llm::{LlmConfig, LlmProvider};
use std::sync::Arc;
use tokio::sync::RwLock;

pub use registry::{Connection, Fellow, Outbound, Registry, RegistryError, OUTBOUND_CAPACITY};

/// Shared application state.
///
/// One value per process, handed to every connection task. The registry lock
/// is only ever held for a single synchronous step, never across the
/// assistant call.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<Registry>>,
    /// Assistant backend (None = no credential, every call falls back)
    pub llm: Option<Arc<dyn LlmProvider>>,
    pub llm_config: LlmConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::new_with_llm(None, LlmConfig::default())
    }

    pub fn new_with_llm(llm: Option<Arc<dyn LlmProvider>>, llm_config: LlmConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::new())),
            llm,
            llm_config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
