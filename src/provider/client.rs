// Provider handle constructed once at process bootstrap and passed into the
// coordinator. Initialization happens in exactly one place, outside the core.

use std::sync::Arc;

use crate::provider::api::{ComputeApi, DatabaseApi, LoadBalancerApi};
use crate::provider::error::ProvisionError;

/// Read-only capability bundle for the cloud provider. Cheap to clone and
/// safe to share across concurrent workflow invocations; creation calls are
/// namespaced by caller-chosen unique names, not by any internal lock.
#[derive(Clone, Default)]
pub struct ProviderHandle {
    compute: Option<Arc<dyn ComputeApi>>,
    elb: Option<Arc<dyn LoadBalancerApi>>,
    rds: Option<Arc<dyn DatabaseApi>>,
}

impl ProviderHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compute(mut self, compute: Arc<dyn ComputeApi>) -> Self {
        self.compute = Some(compute);
        self
    }

    pub fn with_load_balancer(mut self, elb: Arc<dyn LoadBalancerApi>) -> Self {
        self.elb = Some(elb);
        self
    }

    pub fn with_database(mut self, rds: Arc<dyn DatabaseApi>) -> Self {
        self.rds = Some(rds);
        self
    }

    /// Fails fast with `SessionMissing` before any network call is attempted.
    pub fn compute(&self) -> Result<&Arc<dyn ComputeApi>, ProvisionError> {
        self.compute
            .as_ref()
            .ok_or(ProvisionError::SessionMissing("compute"))
    }

    pub fn load_balancer(&self) -> Result<&Arc<dyn LoadBalancerApi>, ProvisionError> {
        self.elb
            .as_ref()
            .ok_or(ProvisionError::SessionMissing("load balancer"))
    }

    pub fn database(&self) -> Result<&Arc<dyn DatabaseApi>, ProvisionError> {
        self.rds
            .as_ref()
            .ok_or(ProvisionError::SessionMissing("database"))
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("compute", &self.compute.is_some())
            .field("elb", &self.elb.is_some())
            .field("rds", &self.rds.is_some())
            .finish()
    }
}
