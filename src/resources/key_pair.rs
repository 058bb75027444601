use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::provider::{ProviderHandle, ProvisionError};
use crate::resources::wait;

/// Durable identity of a created key pair. This is the subset that travels
/// inside the continuation token, material included, so a later call can hand
/// the private key back to the installer without re-creating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: String,
    pub name: String,
    pub pem_name: String,
    pub fingerprint: String,
    pub material: String,
}

/// SSH key pair for a scope, named `{scope}-key`.
#[derive(Clone)]
pub struct KeyPair {
    name: String,
    record: Option<KeyRecord>,
    handle: ProviderHandle,
    created: bool,
}

impl KeyPair {
    pub fn new(scope: &str, handle: ProviderHandle) -> Self {
        Self {
            name: format!("{scope}-key"),
            record: None,
            handle,
            created: false,
        }
    }

    /// Rehydrate from a continuation token. The resulting handle never
    /// deletes: it did not create the key pair in this invocation.
    pub fn from_record(record: KeyRecord, handle: ProviderHandle) -> Self {
        Self {
            name: record.name.clone(),
            record: Some(record),
            handle,
            created: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self) -> Result<&KeyRecord, ProvisionError> {
        self.record
            .as_ref()
            .ok_or_else(|| ProvisionError::Validation(format!("key pair {} not created", self.name)))
    }

    pub async fn create(&mut self) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "key pair {} already created in this invocation",
                self.name
            )));
        }
        let info = self.handle.compute()?.create_key_pair(&self.name).await?;
        info!(key_pair = %self.name, id = %info.id, "created key pair");
        self.record = Some(KeyRecord {
            id: info.id,
            pem_name: format!("{}.pem", info.name),
            name: info.name,
            fingerprint: info.fingerprint,
            material: info.material,
        });
        self.created = true;
        Ok(())
    }

    pub async fn wait_ready(&self) -> Result<(), ProvisionError> {
        let id = self.record()?.id.clone();
        let compute = self.handle.compute()?.clone();
        wait::poll_until(
            "key pair",
            wait::DEFAULT_ATTEMPTS,
            Duration::from_secs(5),
            || {
                let compute = compute.clone();
                let id = id.clone();
                async move { Ok(compute.key_pair_exists(&id).await?.then_some(())) }
            },
        )
        .await
    }

    /// No-op unless this invocation created the key pair.
    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        self.handle.compute()?.delete_key_pair(&self.name).await?;
        info!(key_pair = %self.name, "deleted key pair");
        self.created = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::provider::memory::MemoryProvider;

    fn handle_with(mem: &Arc<MemoryProvider>) -> ProviderHandle {
        ProviderHandle::new().with_compute(mem.clone())
    }

    #[tokio::test]
    async fn delete_without_create_touches_nothing() {
        let mem = Arc::new(MemoryProvider::new());
        let mut key = KeyPair::new("demo-prod", handle_with(&mem));
        key.delete().await.unwrap();
        assert!(mem.calls().is_empty());
    }

    #[tokio::test]
    async fn create_then_delete_round_trips() {
        let mem = Arc::new(MemoryProvider::new());
        let mut key = KeyPair::new("demo-prod", handle_with(&mem));
        key.create().await.unwrap();
        assert_eq!(key.record().unwrap().name, "demo-prod-key");
        assert_eq!(mem.key_pair_count(), 1);
        key.delete().await.unwrap();
        assert_eq!(mem.key_pair_count(), 0);
    }

    #[tokio::test]
    async fn second_create_is_rejected_locally() {
        let mem = Arc::new(MemoryProvider::new());
        let mut key = KeyPair::new("demo-prod", handle_with(&mem));
        key.create().await.unwrap();
        let err = key.create().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
    }

    #[tokio::test]
    async fn rehydrated_key_never_deletes() {
        let mem = Arc::new(MemoryProvider::new());
        let mut original = KeyPair::new("demo-prod", handle_with(&mem));
        original.create().await.unwrap();

        let mut restored =
            KeyPair::from_record(original.record().unwrap().clone(), handle_with(&mem));
        restored.delete().await.unwrap();
        assert_eq!(mem.key_pair_count(), 1);
    }
}
