use serde::{Deserialize, Serialize};
use tracing::info;

use crate::provider::api::{IngressRule, IngressSource};
use crate::provider::{ProviderHandle, ProvisionError};

/// Durable identity of a security group, carried in the continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub id: String,
}

/// Security group for a scope, named `{scope}-sg`.
#[derive(Clone)]
pub struct SecurityGroup {
    scope: String,
    name: String,
    record: Option<GroupRecord>,
    handle: ProviderHandle,
    created: bool,
}

impl SecurityGroup {
    pub fn new(scope: &str, handle: ProviderHandle) -> Self {
        Self {
            scope: scope.to_string(),
            name: format!("{scope}-sg"),
            record: None,
            handle,
            created: false,
        }
    }

    /// Security group for a scope's database, named `{scope}-{name}-db-sg`.
    pub fn for_database(scope: &str, database: &str, handle: ProviderHandle) -> Self {
        Self {
            scope: scope.to_string(),
            name: format!("{scope}-{database}-db-sg"),
            record: None,
            handle,
            created: false,
        }
    }

    pub fn from_record(scope: &str, record: GroupRecord, handle: ProviderHandle) -> Self {
        Self {
            scope: scope.to_string(),
            name: record.name.clone(),
            record: Some(record),
            handle,
            created: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self) -> Result<&GroupRecord, ProvisionError> {
        self.record.as_ref().ok_or_else(|| {
            ProvisionError::Validation(format!("security group {} not created", self.name))
        })
    }

    pub fn id(&self) -> Result<&str, ProvisionError> {
        Ok(self.record()?.id.as_str())
    }

    pub async fn create(&mut self, vpc_id: &str) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "security group {} already created in this invocation",
                self.name
            )));
        }
        let compute = self.handle.compute()?;
        let description = format!("instances in scope {}", self.scope);
        let id = compute
            .create_security_group(&self.name, &description, vpc_id)
            .await?;
        compute
            .create_tags(&[id.clone()], "Name", &self.name)
            .await?;
        compute
            .create_tags(&[id.clone()], "Scope", &self.scope)
            .await?;
        info!(security_group = %self.name, id = %id, "created security group");
        self.record = Some(GroupRecord {
            name: self.name.clone(),
            id,
        });
        self.created = true;
        Ok(())
    }

    /// SSH from anywhere. Instances are key-pair gated, not network gated.
    /// Rules live and die with the group, so this has no own compensation.
    pub async fn authorize_base_ingress(&self) -> Result<(), ProvisionError> {
        let rule = IngressRule::tcp(
            22,
            22,
            IngressSource::Cidr {
                cidr: "0.0.0.0/0".to_string(),
                description: "ssh".to_string(),
            },
        );
        self.handle
            .compute()?
            .authorize_ingress(self.id()?, &[rule])
            .await
    }

    /// Open the service port to traffic from the load balancer's security
    /// group. Returns the rule so a compensation can revoke exactly it.
    pub async fn authorize_loadbalancer_ingress(
        &self,
        lb_group_id: &str,
        port: u16,
    ) -> Result<IngressRule, ProvisionError> {
        let rule = IngressRule::tcp(
            port,
            port,
            IngressSource::Group {
                group_id: lb_group_id.to_string(),
                description: "load balancer".to_string(),
            },
        );
        self.handle
            .compute()?
            .authorize_ingress(self.id()?, std::slice::from_ref(&rule))
            .await?;
        Ok(rule)
    }

    /// Open the database port to traffic from the given security group.
    pub async fn authorize_group_ingress(
        &self,
        source_group_id: &str,
        port: u16,
        description: &str,
    ) -> Result<IngressRule, ProvisionError> {
        let rule = IngressRule::tcp(
            port,
            port,
            IngressSource::Group {
                group_id: source_group_id.to_string(),
                description: description.to_string(),
            },
        );
        self.handle
            .compute()?
            .authorize_ingress(self.id()?, std::slice::from_ref(&rule))
            .await?;
        Ok(rule)
    }

    pub async fn revoke_ingress(&self, rule: &IngressRule) -> Result<(), ProvisionError> {
        self.handle
            .compute()?
            .revoke_ingress(self.id()?, std::slice::from_ref(rule))
            .await
    }

    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        let id = self.record()?.id.clone();
        self.handle.compute()?.delete_security_group(&id).await?;
        info!(security_group = %self.name, id = %id, "deleted security group");
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
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let mut sg = SecurityGroup::new("demo-prod", handle);
        sg.delete().await.unwrap();
        assert!(mem.calls().is_empty());
    }

    #[tokio::test]
    async fn create_then_base_ingress() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let mut sg = SecurityGroup::new("demo-prod", handle);
        sg.create("vpc-default").await.unwrap();
        assert_eq!(sg.record().unwrap().name, "demo-prod-sg");
        sg.authorize_base_ingress().await.unwrap();
        assert!(mem.calls().contains(&"authorize_ingress".to_string()));
    }

    #[tokio::test]
    async fn loadbalancer_rule_revokes_cleanly() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let mut sg = SecurityGroup::new("demo-prod", handle);
        sg.create("vpc-default").await.unwrap();
        let rule = sg.authorize_loadbalancer_ingress("sg-lb", 8080).await.unwrap();
        assert_eq!(rule.from_port, 8080);
        sg.revoke_ingress(&rule).await.unwrap();
    }
}
