// Cloud provider capability, one async trait per service client.
// Adapters for a real provider live outside this crate; the in-memory
// implementation in provider::memory backs dry runs and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::error::ProvisionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairInfo {
    pub id: String,
    pub name: String,
    pub fingerprint: String,
    pub material: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcInfo {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressSource {
    Cidr { cidr: String, description: String },
    Group { group_id: String, description: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    pub from_port: u16,
    pub to_port: u16,
    pub protocol: String,
    pub source: IngressSource,
}

impl IngressRule {
    pub fn tcp(from_port: u16, to_port: u16, source: IngressSource) -> Self {
        Self {
            from_port,
            to_port,
            protocol: "tcp".to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    pub scope: String,
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub security_group_id: String,
    pub root_volume_gb: u32,
}

#[derive(Debug, Clone)]
pub struct LaunchedInstance {
    pub id: String,
    pub network_interface_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Stopping,
    Stopped,
    Terminated,
}

/// Snapshot of one instance as the provider reports it.
#[derive(Debug, Clone)]
pub struct InstanceView {
    pub id: String,
    pub state: InstanceState,
    pub public_dns: Option<String>,
    pub volume_id: Option<String>,
    pub network_interface_id: Option<String>,
    pub image_id: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TargetGroupSpec {
    pub name: String,
    pub port: u16,
    pub vpc_id: String,
    pub health_check_path: String,
}

#[derive(Debug, Clone)]
pub struct DbInstanceSpec {
    pub identifier: String,
    pub database: String,
    pub master_password: String,
    pub security_group_id: String,
    pub storage_gb: u32,
}

#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn create_key_pair(&self, name: &str) -> Result<KeyPairInfo, ProvisionError>;
    async fn key_pair_exists(&self, id: &str) -> Result<bool, ProvisionError>;
    async fn delete_key_pair(&self, name: &str) -> Result<(), ProvisionError>;

    /// The ambient default VPC. Never created by this system.
    async fn default_vpc(&self) -> Result<VpcInfo, ProvisionError>;

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String, ProvisionError>;
    async fn delete_security_group(&self, group_id: &str) -> Result<(), ProvisionError>;
    async fn authorize_ingress(
        &self,
        group_id: &str,
        rules: &[IngressRule],
    ) -> Result<(), ProvisionError>;
    async fn revoke_ingress(
        &self,
        group_id: &str,
        rules: &[IngressRule],
    ) -> Result<(), ProvisionError>;

    async fn run_instance(&self, spec: &InstanceSpec) -> Result<LaunchedInstance, ProvisionError>;
    async fn terminate_instance(&self, id: &str) -> Result<(), ProvisionError>;
    async fn describe_instance(&self, id: &str) -> Result<InstanceView, ProvisionError>;
    /// All instances carrying the given Name tag, any state.
    async fn instances_named(&self, name: &str) -> Result<Vec<InstanceView>, ProvisionError>;

    async fn create_tags(
        &self,
        resource_ids: &[String],
        key: &str,
        value: &str,
    ) -> Result<(), ProvisionError>;
    async fn delete_tags(&self, resource_ids: &[String], key: &str) -> Result<(), ProvisionError>;
    /// Best-effort probe: is any resource tagged key=value? Not strongly
    /// consistent; concurrent writers may not be visible yet.
    async fn tag_exists(&self, key: &str, value: &str) -> Result<bool, ProvisionError>;
}

#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<String, ProvisionError>;
    async fn delete_target_group(&self, arn: &str) -> Result<(), ProvisionError>;
    async fn target_group_arn(&self, name: &str) -> Result<String, ProvisionError>;

    async fn register_target(
        &self,
        target_group_arn: &str,
        instance_id: &str,
    ) -> Result<(), ProvisionError>;
    async fn deregister_target(
        &self,
        target_group_arn: &str,
        instance_id: &str,
    ) -> Result<(), ProvisionError>;

    /// Raw rule priorities for a listener, including the "default" rule.
    async fn rule_priorities(&self, listener_arn: &str) -> Result<Vec<String>, ProvisionError>;
    async fn create_rule(
        &self,
        listener_arn: &str,
        target_group_arn: &str,
        path_patterns: &[String],
        priority: u32,
    ) -> Result<String, ProvisionError>;
    async fn delete_rule(&self, rule_arn: &str) -> Result<(), ProvisionError>;

    async fn listener_load_balancer(&self, listener_arn: &str) -> Result<String, ProvisionError>;

    async fn add_tags(
        &self,
        resource_arns: &[String],
        key: &str,
        value: &str,
    ) -> Result<(), ProvisionError>;
    async fn remove_tags(&self, resource_arns: &[String], key: &str)
        -> Result<(), ProvisionError>;
}

#[async_trait]
pub trait DatabaseApi: Send + Sync {
    async fn create_db_instance(&self, spec: &DbInstanceSpec) -> Result<String, ProvisionError>;
    /// None until the provider has assigned an endpoint.
    async fn db_endpoint(&self, identifier: &str) -> Result<Option<String>, ProvisionError>;
    async fn delete_db_instance(&self, identifier: &str) -> Result<(), ProvisionError>;
}
