//! Client registry for runtime provider lookup and swapping.
//!
//! ```rust
//! use cprovider::ClientRegistry;
//!
//! let registry = ClientRegistry::new();
//! assert!(registry.is_empty());
//! assert_eq!(registry.len(), 0);
//! ```

use std::sync::Arc;

use ccommon::Registry;

use crate::{CompletionClient, ProviderId, StreamingClient};

#[derive(Default)]
pub struct ClientRegistry {
    completion: Registry<ProviderId, Arc<dyn CompletionClient>>,
    streaming: Registry<ProviderId, Arc<dyn StreamingClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_completion<C>(&mut self, client: C)
    where
        C: CompletionClient + 'static,
    {
        self.completion.insert(client.id(), Arc::new(client));
    }

    pub fn register_streaming<C>(&mut self, client: C)
    where
        C: StreamingClient + 'static,
    {
        self.streaming.insert(client.id(), Arc::new(client));
    }

    /// Registers one adapter under both capabilities.
    pub fn register<C>(&mut self, client: C)
    where
        C: CompletionClient + StreamingClient + 'static,
    {
        let client = Arc::new(client);
        let id = client.id();
        self.completion
            .insert(id, client.clone() as Arc<dyn CompletionClient>);
        self.streaming.insert(id, client as Arc<dyn StreamingClient>);
    }

    pub fn completion(&self, provider_id: ProviderId) -> Option<Arc<dyn CompletionClient>> {
        self.completion.get(&provider_id).cloned()
    }

    pub fn streaming(&self, provider_id: ProviderId) -> Option<Arc<dyn StreamingClient>> {
        self.streaming.get(&provider_id).cloned()
    }

    pub fn remove(&mut self, provider_id: ProviderId) -> bool {
        let completion = self.completion.remove(&provider_id).is_some();
        let streaming = self.streaming.remove(&provider_id).is_some();
        completion || streaming
    }

    pub fn contains(&self, provider_id: ProviderId) -> bool {
        self.completion.contains_key(&provider_id) || self.streaming.contains_key(&provider_id)
    }

    pub fn len(&self) -> usize {
        let streaming_only = self
            .streaming
            .values()
            .filter(|client| !self.completion.contains_key(&client.id()))
            .count();
        self.completion.len() + streaming_only
    }

    pub fn is_empty(&self) -> bool {
        self.completion.is_empty() && self.streaming.is_empty()
    }
}
