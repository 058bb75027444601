use tracing::info;

use crate::provider::{ProviderHandle, ProvisionError};
use crate::resources::listener::Listener;
use crate::resources::target_group::TargetGroup;

/// Path-routing rule forwarding `/{path}` and `/{path}/*` on a listener to a
/// target group. Priority is chosen by the coordinator as highest + 1.
#[derive(Clone)]
pub struct Rule {
    listener_arn: String,
    target_group_arn: String,
    path: String,
    priority: u32,
    arn: Option<String>,
    handle: ProviderHandle,
    created: bool,
}

impl Rule {
    pub fn new(
        listener: &Listener,
        target_group: &TargetGroup,
        path: &str,
        priority: u32,
        handle: ProviderHandle,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            listener_arn: listener.arn().to_string(),
            target_group_arn: target_group.arn()?.to_string(),
            path: path.trim_matches('/').to_string(),
            priority,
            arn: None,
            handle,
            created: false,
        })
    }

    pub fn arn(&self) -> Result<&str, ProvisionError> {
        self.arn.as_deref().ok_or_else(|| {
            ProvisionError::Validation(format!("rule for /{} not created", self.path))
        })
    }

    pub async fn create(&mut self) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "rule for /{} already created in this invocation",
                self.path
            )));
        }
        let patterns = vec![format!("/{}", self.path), format!("/{}/*", self.path)];
        let arn = self
            .handle
            .load_balancer()?
            .create_rule(
                &self.listener_arn,
                &self.target_group_arn,
                &patterns,
                self.priority,
            )
            .await?;
        info!(path = %self.path, priority = self.priority, "created listener rule");
        self.arn = Some(arn);
        self.created = true;
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        let arn = self.arn()?.to_string();
        self.handle.load_balancer()?.delete_rule(&arn).await?;
        info!(path = %self.path, "deleted listener rule");
        self.created = false;
        Ok(())
    }
}
