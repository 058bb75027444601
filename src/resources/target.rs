use tracing::info;

use crate::provider::{ProviderHandle, ProvisionError};
use crate::resources::server::Server;
use crate::resources::target_group::TargetGroup;

/// Membership of one server in one target group.
#[derive(Clone)]
pub struct Target {
    target_group_arn: String,
    instance_id: String,
    handle: ProviderHandle,
    created: bool,
}

impl Target {
    pub fn new(
        target_group: &TargetGroup,
        server: &Server,
        handle: ProviderHandle,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            target_group_arn: target_group.arn()?.to_string(),
            instance_id: server.id()?.to_string(),
            handle,
            created: false,
        })
    }

    pub async fn create(&mut self) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "target {} already registered in this invocation",
                self.instance_id
            )));
        }
        self.handle
            .load_balancer()?
            .register_target(&self.target_group_arn, &self.instance_id)
            .await?;
        info!(instance = %self.instance_id, "registered target");
        self.created = true;
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        self.handle
            .load_balancer()?
            .deregister_target(&self.target_group_arn, &self.instance_id)
            .await?;
        info!(instance = %self.instance_id, "deregistered target");
        self.created = false;
        Ok(())
    }
}
