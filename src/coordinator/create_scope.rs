use tracing::instrument;

use crate::compensation::CompensationStack;
use crate::coordinator::{naming, Coordinator};
use crate::provider::ProvisionError;
use crate::resources::{KeyPair, SecurityGroup, Vpc};
use crate::token::{self, TokenPayload};

/// Everything the caller gets back from a successful scope creation. The
/// token is the only thing a follow-up call needs; the ids are informational.
#[derive(Debug, Clone)]
pub struct ScopeCreated {
    pub token: String,
    pub key_name: String,
    pub security_group_id: String,
    pub vpc_id: String,
}

impl Coordinator {
    /// Stand up the shared base of a scope: SSH key pair, default VPC
    /// discovery, security group with base ingress. Returns a sealed
    /// continuation token for the follow-up workflows. A notification thread
    /// id, when given, travels in the token so every follow-up workflow
    /// reports back into the caller's thread.
    #[instrument(skip(self, thread))]
    pub async fn create_scope(
        &self,
        scope: &str,
        thread: Option<&str>,
    ) -> Result<ScopeCreated, ProvisionError> {
        naming::check_scope(scope)?;
        let mut stack = CompensationStack::new();
        match self.create_scope_inner(scope, thread, &mut stack).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.rollback(stack).await;
                Err(err)
            }
        }
    }

    async fn create_scope_inner(
        &self,
        scope: &str,
        thread: Option<&str>,
        stack: &mut CompensationStack,
    ) -> Result<ScopeCreated, ProvisionError> {
        self.status.send(format!("Creating scope {scope}"));

        let mut key = KeyPair::new(scope, self.provider.clone());
        key.create().await?;
        let undo = key.clone();
        stack.push("key pair", move || async move {
            let mut key = undo;
            key.delete().await
        });
        key.wait_ready().await?;
        self.status.send(format!("Created key pair {}", key.name()));

        // Discovery only, nothing to compensate.
        let vpc = Vpc::default_vpc(&self.provider).await?;

        let mut security_group = SecurityGroup::new(scope, self.provider.clone());
        security_group.create(vpc.id()).await?;
        let undo = security_group.clone();
        stack.push("security group", move || async move {
            let mut security_group = undo;
            security_group.delete().await
        });
        security_group.authorize_base_ingress().await?;
        self.status
            .send(format!("Created security group {}", security_group.name()));

        let mut thread_id = thread.map(str::to_string);
        self.send_result(&mut thread_id, format!("Scope {scope} is ready"))
            .await?;

        let payload = TokenPayload {
            scope: scope.to_string(),
            vpc: vpc.info.clone(),
            key: key.record()?.clone(),
            security_group: security_group.record()?.clone(),
            thread_id,
        };
        let sealed = token::seal(&payload, self.cipher.as_ref())?;

        Ok(ScopeCreated {
            token: sealed,
            key_name: key.name().to_string(),
            security_group_id: security_group.id()?.to_string(),
            vpc_id: vpc.id().to_string(),
        })
    }
}
