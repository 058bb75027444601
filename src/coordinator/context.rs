use crate::provider::ProviderHandle;
use crate::resources::{KeyPair, SecurityGroup, Vpc};
use crate::token::TokenPayload;

/// What the caller wants deployed: the artifact to install, the port it
/// serves on and the path prefix it is routed under.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub artifact_id: String,
    pub port: u16,
    pub path: String,
}

/// Mutable aggregate for one workflow invocation. Rehydrated from a
/// continuation token at the start of a follow-up call; only the durable
/// subset goes back into the token at the end.
pub struct WorkflowContext {
    pub scope: String,
    pub vpc: Vpc,
    pub key: KeyPair,
    pub security_group: SecurityGroup,
    pub thread_id: Option<String>,
}

impl WorkflowContext {
    pub fn from_token(payload: TokenPayload, handle: &ProviderHandle) -> Self {
        Self {
            vpc: Vpc::from_info(payload.vpc),
            key: KeyPair::from_record(payload.key, handle.clone()),
            security_group: SecurityGroup::from_record(
                &payload.scope,
                payload.security_group,
                handle.clone(),
            ),
            scope: payload.scope,
            thread_id: payload.thread_id,
        }
    }

    /// The durable subset, ready to be sealed again.
    pub fn to_payload(&self) -> Result<TokenPayload, crate::provider::ProvisionError> {
        Ok(TokenPayload {
            scope: self.scope.clone(),
            vpc: self.vpc.info.clone(),
            key: self.key.record()?.clone(),
            security_group: self.security_group.record()?.clone(),
            thread_id: self.thread_id.clone(),
        })
    }
}
