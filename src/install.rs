// Remote software installation on a freshly provisioned server. The concrete
// SSH runner lives outside this crate; the coordinator only needs the verb.

use async_trait::async_trait;
use tracing::info;

use crate::coordinator::ServiceDescriptor;
use crate::provider::ProvisionError;

#[async_trait]
pub trait RemoteInstaller: Send + Sync {
    /// Install and start the service on `host`, authenticating with the
    /// scope's private key material. Covers the runtime, the service user,
    /// the service script and log shipping. Failure rolls the workflow back
    /// like any provisioning step.
    async fn install_service(
        &self,
        host: &str,
        key_material: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), ProvisionError>;
}

/// Installer that only logs what it would do. Backs dry runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstaller;

#[async_trait]
impl RemoteInstaller for NoopInstaller {
    async fn install_service(
        &self,
        host: &str,
        _key_material: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), ProvisionError> {
        info!(host = %host, artifact = %descriptor.artifact_id, "skipping remote install (dry run)");
        Ok(())
    }
}
