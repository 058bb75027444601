use tracing::info;

use crate::provider::{ProviderHandle, ProvisionError};
use crate::resources::key_pair::KeyPair;
use crate::resources::listener::Listener;
use crate::resources::rule::Rule;
use crate::resources::security_group::SecurityGroup;
use crate::resources::server::Server;
use crate::resources::target_group::TargetGroup;

/// Tag set marking every resource that belongs to a deployed artifact:
/// key = artifact id, value = scope. The tag is how a later invocation
/// discovers that an artifact is already wired up in a scope.
#[derive(Clone)]
pub struct TagSet {
    artifact_id: String,
    scope: String,
    compute_ids: Vec<String>,
    elb_arns: Vec<String>,
    handle: ProviderHandle,
    created: bool,
}

impl TagSet {
    /// Everything a freshly deployed service touches, compute and
    /// load-balancer side.
    #[allow(clippy::too_many_arguments)]
    pub async fn for_new_service(
        artifact_id: &str,
        scope: &str,
        key: &KeyPair,
        security_group: &SecurityGroup,
        server: &Server,
        target_group: &TargetGroup,
        rule: &Rule,
        listener: &Listener,
        handle: ProviderHandle,
    ) -> Result<Self, ProvisionError> {
        let load_balancer_arn = listener.load_balancer_arn().await?;
        Ok(Self {
            artifact_id: artifact_id.to_string(),
            scope: scope.to_string(),
            compute_ids: vec![
                key.record()?.id.clone(),
                security_group.id()?.to_string(),
                server.id()?.to_string(),
                server.network_interface_id()?.to_string(),
                server.volume_id()?.to_string(),
                server.image_id().to_string(),
            ],
            elb_arns: vec![
                target_group.arn()?.to_string(),
                rule.arn()?.to_string(),
                listener.arn().to_string(),
                load_balancer_arn,
            ],
            handle,
            created: false,
        })
    }

    /// Only the resources an additional server adds to an already-tagged
    /// artifact.
    pub fn for_additional_server(
        artifact_id: &str,
        scope: &str,
        server: &Server,
        handle: ProviderHandle,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            artifact_id: artifact_id.to_string(),
            scope: scope.to_string(),
            compute_ids: vec![
                server.id()?.to_string(),
                server.network_interface_id()?.to_string(),
                server.volume_id()?.to_string(),
                server.image_id().to_string(),
            ],
            elb_arns: Vec::new(),
            handle,
            created: false,
        })
    }

    /// Best-effort probe: is the artifact already tagged into the scope?
    /// Not strongly consistent; a concurrent writer may not be visible yet.
    pub async fn exists(
        artifact_id: &str,
        scope: &str,
        handle: &ProviderHandle,
    ) -> Result<bool, ProvisionError> {
        handle.compute()?.tag_exists(artifact_id, scope).await
    }

    pub async fn create(&mut self) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "tags for {} already created in this invocation",
                self.artifact_id
            )));
        }
        self.handle
            .compute()?
            .create_tags(&self.compute_ids, &self.artifact_id, &self.scope)
            .await?;
        if !self.elb_arns.is_empty() {
            self.handle
                .load_balancer()?
                .add_tags(&self.elb_arns, &self.artifact_id, &self.scope)
                .await?;
        }
        info!(artifact = %self.artifact_id, scope = %self.scope, "tagged artifact resources");
        self.created = true;
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        self.handle
            .compute()?
            .delete_tags(&self.compute_ids, &self.artifact_id)
            .await?;
        if !self.elb_arns.is_empty() {
            self.handle
                .load_balancer()?
                .remove_tags(&self.elb_arns, &self.artifact_id)
                .await?;
        }
        info!(artifact = %self.artifact_id, "removed artifact tags");
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
    async fn probe_sees_additional_server_tags() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new()
            .with_compute(mem.clone())
            .with_load_balancer(mem.clone());

        let mut key = KeyPair::new("demo-prod", handle.clone());
        key.create().await.unwrap();
        let mut sg = SecurityGroup::new("demo-prod", handle.clone());
        sg.create("vpc-default").await.unwrap();
        let mut server =
            Server::new("web-1", "demo-prod", &key, &sg, "ami-123", "t3.micro", handle.clone())
                .unwrap();
        server.create().await.unwrap();
        server.wait_until_running().await.unwrap();

        assert!(!TagSet::exists("events-api", "demo-prod", &handle).await.unwrap());

        let mut tags =
            TagSet::for_additional_server("events-api", "demo-prod", &server, handle.clone())
                .unwrap();
        tags.create().await.unwrap();
        assert!(TagSet::exists("events-api", "demo-prod", &handle).await.unwrap());

        tags.delete().await.unwrap();
        assert!(!TagSet::exists("events-api", "demo-prod", &handle).await.unwrap());
    }
}
