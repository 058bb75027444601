use std::time::Duration;

use tracing::info;

use crate::provider::api::{InstanceSpec, InstanceState, InstanceView};
use crate::provider::{ProviderHandle, ProvisionError};
use crate::resources::key_pair::KeyPair;
use crate::resources::security_group::SecurityGroup;
use crate::resources::wait;

const ROOT_VOLUME_GB: u32 = 20;

/// Launch inputs that only exist for servers this invocation creates.
/// Servers resolved with `Server::get` carry none and cannot be launched.
#[derive(Clone)]
struct LaunchParams {
    instance_type: String,
    key_name: String,
    security_group_id: String,
}

/// One compute instance, tagged Name + Scope on the instance and its root
/// volume. Identity inside a scope is the Name tag; a name is only free when
/// every instance holding it is terminated.
#[derive(Clone)]
pub struct Server {
    name: String,
    scope: String,
    image_id: String,
    launch: Option<LaunchParams>,
    id: Option<String>,
    network_interface_id: Option<String>,
    volume_id: Option<String>,
    public_dns: Option<String>,
    handle: ProviderHandle,
    created: bool,
}

impl Server {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        scope: &str,
        key: &KeyPair,
        security_group: &SecurityGroup,
        image_id: &str,
        instance_type: &str,
        handle: ProviderHandle,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            name: name.to_string(),
            scope: scope.to_string(),
            image_id: image_id.to_string(),
            launch: Some(LaunchParams {
                instance_type: instance_type.to_string(),
                key_name: key.record()?.name.clone(),
                security_group_id: security_group.id()?.to_string(),
            }),
            id: None,
            network_interface_id: None,
            volume_id: None,
            public_dns: None,
            handle,
            created: false,
        })
    }

    /// Resolve a running instance by Name tag within a scope. The handle this
    /// returns did not create the instance, so its Delete is a no-op.
    pub async fn get(
        name: &str,
        scope: &str,
        handle: ProviderHandle,
    ) -> Result<Self, ProvisionError> {
        let candidates = handle.compute()?.instances_named(name).await?;
        let view = candidates
            .into_iter()
            .find(|v| {
                v.state == InstanceState::Running
                    && v.scope.as_deref() == Some(scope)
                    && v.volume_id.is_some()
                    && v.network_interface_id.is_some()
            })
            .ok_or_else(|| {
                ProvisionError::Validation(format!(
                    "no running server named {name} in scope {scope}"
                ))
            })?;
        Ok(Self::from_view(name, scope, view, handle))
    }

    /// A name is available only when every instance holding it is terminated.
    pub async fn name_available(
        name: &str,
        handle: &ProviderHandle,
    ) -> Result<bool, ProvisionError> {
        let candidates = handle.compute()?.instances_named(name).await?;
        Ok(candidates
            .iter()
            .all(|v| v.state == InstanceState::Terminated))
    }

    fn from_view(name: &str, scope: &str, view: InstanceView, handle: ProviderHandle) -> Self {
        Self {
            name: name.to_string(),
            scope: scope.to_string(),
            image_id: view.image_id,
            launch: None,
            id: Some(view.id),
            network_interface_id: view.network_interface_id,
            volume_id: view.volume_id,
            public_dns: view.public_dns,
            handle,
            created: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn id(&self) -> Result<&str, ProvisionError> {
        self.id
            .as_deref()
            .ok_or_else(|| ProvisionError::Validation(format!("server {} not created", self.name)))
    }

    pub fn network_interface_id(&self) -> Result<&str, ProvisionError> {
        self.network_interface_id.as_deref().ok_or_else(|| {
            ProvisionError::Validation(format!("server {} has no network interface", self.name))
        })
    }

    pub fn volume_id(&self) -> Result<&str, ProvisionError> {
        self.volume_id.as_deref().ok_or_else(|| {
            ProvisionError::Validation(format!("server {} has no resolved volume", self.name))
        })
    }

    pub fn public_dns(&self) -> Result<&str, ProvisionError> {
        self.public_dns.as_deref().ok_or_else(|| {
            ProvisionError::Validation(format!("server {} has no public dns yet", self.name))
        })
    }

    pub async fn create(&mut self) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "server {} already created in this invocation",
                self.name
            )));
        }
        let launch = self.launch.as_ref().ok_or_else(|| {
            ProvisionError::Validation(format!(
                "server {} was resolved, not launched here",
                self.name
            ))
        })?;
        let spec = InstanceSpec {
            name: self.name.clone(),
            scope: self.scope.clone(),
            image_id: self.image_id.clone(),
            instance_type: launch.instance_type.clone(),
            key_name: launch.key_name.clone(),
            security_group_id: launch.security_group_id.clone(),
            root_volume_gb: ROOT_VOLUME_GB,
        };
        let launched = self.handle.compute()?.run_instance(&spec).await?;
        info!(server = %self.name, id = %launched.id, "launched instance");
        self.id = Some(launched.id);
        self.network_interface_id = Some(launched.network_interface_id);
        self.created = true;
        Ok(())
    }

    /// Poll until running, then capture public DNS and root volume id.
    pub async fn wait_until_running(&mut self) -> Result<(), ProvisionError> {
        let view = self
            .wait_for_state("server running", InstanceState::Running, Duration::from_secs(1))
            .await?;
        self.public_dns = view.public_dns;
        self.volume_id = view.volume_id;
        Ok(())
    }

    pub async fn wait_until_terminated(&self) -> Result<(), ProvisionError> {
        self.wait_for_state(
            "server terminated",
            InstanceState::Terminated,
            Duration::from_secs(15),
        )
        .await?;
        Ok(())
    }

    async fn wait_for_state(
        &self,
        what: &str,
        target: InstanceState,
        interval: Duration,
    ) -> Result<InstanceView, ProvisionError> {
        let id = self.id()?.to_string();
        let compute = self.handle.compute()?.clone();
        wait::poll_until(what, wait::DEFAULT_ATTEMPTS, interval, || {
            let compute = compute.clone();
            let id = id.clone();
            async move {
                let view = compute.describe_instance(&id).await?;
                Ok((view.state == target).then_some(view))
            }
        })
        .await
    }

    /// Terminate and wait out the shutdown. No-op unless this invocation
    /// created the instance.
    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        let id = self.id()?.to_string();
        self.handle.compute()?.terminate_instance(&id).await?;
        self.wait_until_terminated().await?;
        info!(server = %self.name, id = %id, "terminated instance");
        self.created = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::provider::memory::MemoryProvider;

    async fn scope_fixtures(handle: &ProviderHandle) -> (KeyPair, SecurityGroup) {
        let mut key = KeyPair::new("demo-prod", handle.clone());
        key.create().await.unwrap();
        let mut sg = SecurityGroup::new("demo-prod", handle.clone());
        sg.create("vpc-default").await.unwrap();
        (key, sg)
    }

    #[tokio::test]
    async fn delete_without_create_touches_nothing() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let (key, sg) = scope_fixtures(&handle).await;
        let calls_before = mem.calls().len();

        let mut server =
            Server::new("web-1", "demo-prod", &key, &sg, "ami-123", "t3.micro", handle).unwrap();
        server.delete().await.unwrap();
        assert_eq!(mem.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn create_and_wait_resolves_dns_and_volume() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let (key, sg) = scope_fixtures(&handle).await;

        let mut server =
            Server::new("web-1", "demo-prod", &key, &sg, "ami-123", "t3.micro", handle).unwrap();
        server.create().await.unwrap();
        server.wait_until_running().await.unwrap();
        assert!(server.public_dns().unwrap().ends_with("example.internal"));
        assert!(server.volume_id().is_ok());
        assert!(server.network_interface_id().is_ok());
    }

    #[tokio::test]
    async fn name_is_unavailable_until_terminated() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let (key, sg) = scope_fixtures(&handle).await;

        let mut server = Server::new(
            "web-1",
            "demo-prod",
            &key,
            &sg,
            "ami-123",
            "t3.micro",
            handle.clone(),
        )
        .unwrap();
        server.create().await.unwrap();
        assert!(!Server::name_available("web-1", &handle).await.unwrap());

        server.delete().await.unwrap();
        assert!(Server::name_available("web-1", &handle).await.unwrap());
        assert!(Server::name_available("never-used", &handle).await.unwrap());
    }

    #[tokio::test]
    async fn get_resolves_running_instance_in_scope() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let (key, sg) = scope_fixtures(&handle).await;

        let mut server = Server::new(
            "web-1",
            "demo-prod",
            &key,
            &sg,
            "ami-123",
            "t3.micro",
            handle.clone(),
        )
        .unwrap();
        server.create().await.unwrap();

        let resolved = Server::get("web-1", "demo-prod", handle.clone()).await.unwrap();
        assert_eq!(resolved.id().unwrap(), server.id().unwrap());

        let miss = Server::get("web-1", "other-scope", handle).await;
        assert!(matches!(miss, Err(ProvisionError::Validation(_))));
    }

    #[tokio::test]
    async fn resolved_server_cannot_be_launched() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_compute(mem.clone());
        let (key, sg) = scope_fixtures(&handle).await;

        let mut server = Server::new(
            "web-1",
            "demo-prod",
            &key,
            &sg,
            "ami-123",
            "t3.micro",
            handle.clone(),
        )
        .unwrap();
        server.create().await.unwrap();
        let launches_before = mem.calls().iter().filter(|c| *c == "run_instance").count();

        let mut resolved = Server::get("web-1", "demo-prod", handle).await.unwrap();
        let err = resolved.create().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
        assert_eq!(
            mem.calls().iter().filter(|c| *c == "run_instance").count(),
            launches_before
        );
    }
}
