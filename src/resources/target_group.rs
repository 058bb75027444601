use tracing::info;

use crate::provider::api::TargetGroupSpec;
use crate::provider::{ProviderHandle, ProvisionError};

/// Load-balancer target group for one service. The name is computed by the
/// coordinator's naming rules and is deterministic per (scope, service), so a
/// later invocation can resolve the group without carrying its ARN around.
#[derive(Clone)]
pub struct TargetGroup {
    name: String,
    port: u16,
    path: String,
    arn: Option<String>,
    handle: ProviderHandle,
    created: bool,
}

impl TargetGroup {
    pub fn new(name: &str, port: u16, path: &str, handle: ProviderHandle) -> Self {
        Self {
            name: name.to_string(),
            port,
            path: path.trim_matches('/').to_string(),
            arn: None,
            handle,
            created: false,
        }
    }

    /// Resolve an existing group by its deterministic name. Never deletes.
    pub async fn get(name: &str, handle: ProviderHandle) -> Result<Self, ProvisionError> {
        let arn = handle.load_balancer()?.target_group_arn(name).await?;
        Ok(Self {
            name: name.to_string(),
            port: 0,
            path: String::new(),
            arn: Some(arn),
            handle,
            created: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arn(&self) -> Result<&str, ProvisionError> {
        self.arn.as_deref().ok_or_else(|| {
            ProvisionError::Validation(format!("target group {} not created", self.name))
        })
    }

    pub async fn create(&mut self, vpc_id: &str) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "target group {} already created in this invocation",
                self.name
            )));
        }
        let spec = TargetGroupSpec {
            name: self.name.clone(),
            port: self.port,
            vpc_id: vpc_id.to_string(),
            health_check_path: format!("/{}/health", self.path),
        };
        let arn = self.handle.load_balancer()?.create_target_group(&spec).await?;
        info!(target_group = %self.name, arn = %arn, "created target group");
        self.arn = Some(arn);
        self.created = true;
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        let arn = self.arn()?.to_string();
        self.handle.load_balancer()?.delete_target_group(&arn).await?;
        info!(target_group = %self.name, "deleted target group");
        self.created = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::provider::memory::MemoryProvider;

    #[tokio::test]
    async fn delete_without_create_touches_nothing() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_load_balancer(mem.clone());
        let mut tg = TargetGroup::new("demo-events-tg", 8080, "events", handle);
        tg.delete().await.unwrap();
        assert!(mem.calls().is_empty());
    }

    #[tokio::test]
    async fn get_resolves_by_name() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_load_balancer(mem.clone());
        let mut tg = TargetGroup::new("demo-events-tg", 8080, "events", handle.clone());
        tg.create("vpc-default").await.unwrap();

        let resolved = TargetGroup::get("demo-events-tg", handle).await.unwrap();
        assert_eq!(resolved.arn().unwrap(), tg.arn().unwrap());
    }
}
