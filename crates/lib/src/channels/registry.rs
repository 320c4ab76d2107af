//! Channel registry: register and lookup channels by id.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle to a running channel (stop, reply).
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "line").
    fn id(&self) -> &str;

    /// Stop the channel connector.
    fn stop(&self);

    /// Deliver a reply using the platform's opaque reply handle. Best-effort:
    /// the pipeline does not depend on the outcome. Default returns error.
    async fn reply(&self, _reply_token: &str, _text: &str) -> Result<(), String> {
        Err("reply not implemented".to_string())
    }
}

/// Registry of channel ids to handles. Shared across the gateway.
pub struct ChannelRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn ChannelHandle>>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, id: String, handle: Arc<dyn ChannelHandle>) {
        let mut g = self.inner.write().await;
        if let Some(old) = g.insert(id.clone(), handle) {
            old.stop();
        }
    }

    pub async fn get(&self, id: &str) -> Option<Arc<dyn ChannelHandle>> {
        let g = self.inner.read().await;
        g.get(id).cloned()
    }

    pub async fn ids(&self) -> Vec<String> {
        let g = self.inner.read().await;
        g.keys().cloned().collect()
    }
}
