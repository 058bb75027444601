use tracing::instrument;

use crate::compensation::CompensationStack;
use crate::coordinator::{Coordinator, WorkflowContext};
use crate::provider::ProvisionError;
use crate::resources::Server;
use crate::token;

#[derive(Debug, Clone)]
pub struct ServerAdded {
    pub token: String,
    pub server_id: String,
    pub public_dns: String,
}

impl Coordinator {
    /// Launch a named server into an existing scope. The name must not be
    /// held by any non-terminated instance; a taken name fails before any
    /// mutation.
    #[instrument(skip(self, sealed_token))]
    pub async fn add_server_to_scope(
        &self,
        scope: &str,
        server_name: &str,
        sealed_token: &str,
    ) -> Result<ServerAdded, ProvisionError> {
        // A bad token is a caller error; nothing exists yet, so no rollback.
        let payload = token::open(sealed_token, scope, self.cipher.as_ref())?;
        let mut ctx = WorkflowContext::from_token(payload, &self.provider);

        let mut stack = CompensationStack::new();
        match self.add_server_inner(&mut ctx, server_name, &mut stack).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.rollback(stack).await;
                Err(err)
            }
        }
    }

    async fn add_server_inner(
        &self,
        ctx: &mut WorkflowContext,
        server_name: &str,
        stack: &mut CompensationStack,
    ) -> Result<ServerAdded, ProvisionError> {
        if !Server::name_available(server_name, &self.provider).await? {
            return Err(ProvisionError::Duplicate {
                what: format!("server name {server_name}"),
            });
        }
        self.status
            .send(format!("Adding server {server_name} to scope {}", ctx.scope));

        let mut server = Server::new(
            server_name,
            &ctx.scope,
            &ctx.key,
            &ctx.security_group,
            &self.settings.image_id,
            &self.settings.instance_type,
            self.provider.clone(),
        )?;
        server.create().await?;
        let undo = server.clone();
        stack.push("server", move || async move {
            let mut server = undo;
            server.delete().await
        });

        server.wait_until_running().await?;
        self.send_result(
            &mut ctx.thread_id,
            format!("Server {server_name} is running"),
        )
        .await?;

        let sealed = token::seal(&ctx.to_payload()?, self.cipher.as_ref())?;
        Ok(ServerAdded {
            token: sealed,
            server_id: server.id()?.to_string(),
            public_dns: server.public_dns()?.to_string(),
        })
    }
}
