use crate::domain::{errors::ViewStateError, models::ViewStateStore};
use dashmap::DashMap;

#[derive(Clone, Default)]
pub struct InMemoryViewStore {
    // key -> raw JSON value
    entries: DashMap<String, String>,
}

#[async_trait::async_trait]
impl ViewStateStore for InMemoryViewStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ViewStateError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn save(&self, key: &str, value: String) -> Result<(), ViewStateError> {
        if let Some(previous) = self.entries.insert(key.to_string(), value) {
            tracing::debug!("Replaced view state {} ({} bytes)", key, previous.len());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ViewStateError> {
        self.entries.remove(key);
        Ok(())
    }
}
