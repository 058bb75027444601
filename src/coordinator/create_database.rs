use tracing::instrument;

use crate::compensation::CompensationStack;
use crate::coordinator::{Coordinator, WorkflowContext};
use crate::provider::ProvisionError;
use crate::resources::{Database, SecurityGroup};
use crate::token;

const POSTGRES_PORT: u16 = 5432;

#[derive(Debug, Clone)]
pub struct DatabaseCreated {
    pub token: String,
    pub identifier: String,
    pub endpoint: String,
}

impl Coordinator {
    /// Provision a managed database for a scope, reachable only from the
    /// scope's servers. Credentials go out through the notifier directly,
    /// never through the batched status channel.
    #[instrument(skip(self, sealed_token))]
    pub async fn create_database(
        &self,
        scope: &str,
        database: &str,
        sealed_token: &str,
    ) -> Result<DatabaseCreated, ProvisionError> {
        let payload = token::open(sealed_token, scope, self.cipher.as_ref())?;
        let mut ctx = WorkflowContext::from_token(payload, &self.provider);

        let mut stack = CompensationStack::new();
        match self.create_database_inner(&mut ctx, database, &mut stack).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.rollback(stack).await;
                Err(err)
            }
        }
    }

    async fn create_database_inner(
        &self,
        ctx: &mut WorkflowContext,
        database: &str,
        stack: &mut CompensationStack,
    ) -> Result<DatabaseCreated, ProvisionError> {
        self.status.send(format!(
            "Creating database {database} in scope {}",
            ctx.scope
        ));

        let mut db_security_group =
            SecurityGroup::for_database(&ctx.scope, database, self.provider.clone());
        db_security_group.create(ctx.vpc.id()).await?;
        let undo = db_security_group.clone();
        stack.push("database security group", move || async move {
            let mut db_security_group = undo;
            db_security_group.delete().await
        });
        db_security_group
            .authorize_group_ingress(ctx.security_group.id()?, POSTGRES_PORT, "scope servers")
            .await?;

        let mut db = Database::new(
            &ctx.scope,
            database,
            db_security_group.id()?,
            self.provider.clone(),
        );
        db.create().await?;
        let undo = db.clone();
        stack.push("database instance", move || async move {
            let mut db = undo;
            db.delete().await
        });
        self.status
            .send(format!("Waiting for database {} endpoint", db.identifier()));

        db.wait_for_endpoint().await?;

        // Connection details carry the master password; deliver them as one
        // direct message instead of a coalesced status line, continuing the
        // caller's thread when the token names one.
        let credentials = format!(
            "Database {} is ready at {} (user postgres, password {})",
            db.identifier(),
            db.endpoint()?,
            db.password()
        );
        match ctx.thread_id.take() {
            Some(id) => {
                let new_id = self.notifier.send_followup(&credentials, &id).await?;
                ctx.thread_id = Some(new_id);
            }
            None => self.notifier.send_status(&credentials).await?,
        }

        Ok(DatabaseCreated {
            token: token::seal(&ctx.to_payload()?, self.cipher.as_ref())?,
            identifier: db.identifier().to_string(),
            endpoint: db.endpoint()?.to_string(),
        })
    }
}
