use crate::provider::api::VpcInfo;
use crate::provider::{ProviderHandle, ProvisionError};

/// Discovery-only handle for the ambient default VPC. Never created by this
/// system and never compensated.
#[derive(Debug, Clone)]
pub struct Vpc {
    pub info: VpcInfo,
}

impl Vpc {
    pub async fn default_vpc(handle: &ProviderHandle) -> Result<Self, ProvisionError> {
        let info = handle.compute()?.default_vpc().await?;
        Ok(Self { info })
    }

    pub fn from_info(info: VpcInfo) -> Self {
        Self { info }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }
}
