use tracing::instrument;

use crate::compensation::CompensationStack;
use crate::coordinator::{naming, Coordinator, ServiceDescriptor, WorkflowContext};
use crate::provider::ProvisionError;
use crate::resources::{Listener, Rule, Server, TagSet, Target, TargetGroup};
use crate::token;

#[derive(Debug, Clone)]
pub struct ServiceAdded {
    pub token: String,
    pub target_group_arn: String,
    pub rule_arn: Option<String>,
    pub reused_target_group: bool,
}

/// Load-balancer wiring produced by either deployment branch.
struct RoutingOutcome {
    target_group_arn: String,
    rule_arn: Option<String>,
    reused_target_group: bool,
}

impl Coordinator {
    /// Wire a service onto a running server. First deployment of an artifact
    /// into a scope builds the full routing chain; a repeat deployment on
    /// another server only joins the existing chain.
    #[instrument(skip(self, sealed_token), fields(artifact = %descriptor.artifact_id))]
    pub async fn add_service_to_server(
        &self,
        scope: &str,
        server_name: &str,
        descriptor: &ServiceDescriptor,
        sealed_token: &str,
    ) -> Result<ServiceAdded, ProvisionError> {
        let payload = token::open(sealed_token, scope, self.cipher.as_ref())?;
        let mut ctx = WorkflowContext::from_token(payload, &self.provider);
        // Name derivation runs before any provider call.
        let target_group_name = naming::target_group_name(scope, &descriptor.artifact_id)?;

        let mut stack = CompensationStack::new();
        match self
            .add_service_inner(&mut ctx, server_name, descriptor, &target_group_name, &mut stack)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.rollback(stack).await;
                Err(err)
            }
        }
    }

    async fn add_service_inner(
        &self,
        ctx: &mut WorkflowContext,
        server_name: &str,
        descriptor: &ServiceDescriptor,
        target_group_name: &str,
        stack: &mut CompensationStack,
    ) -> Result<ServiceAdded, ProvisionError> {
        let server = Server::get(server_name, &ctx.scope, self.provider.clone()).await?;
        self.status.send(format!(
            "Deploying {} to {server_name} in scope {}",
            descriptor.artifact_id, ctx.scope
        ));

        // Best-effort probe; a concurrent deployment of the same artifact may
        // not be visible yet.
        let already_deployed =
            TagSet::exists(&descriptor.artifact_id, &ctx.scope, &self.provider).await?;

        let routing = if already_deployed {
            self.join_existing_service(ctx, &server, descriptor, target_group_name, stack)
                .await?
        } else {
            self.deploy_new_service(ctx, &server, descriptor, target_group_name, stack)
                .await?
        };

        self.status.send(format!(
            "Installing {} on {server_name}",
            descriptor.artifact_id
        ));
        self.installer
            .install_service(server.public_dns()?, &ctx.key.record()?.material, descriptor)
            .await?;
        self.send_result(
            &mut ctx.thread_id,
            format!("Service {} is live on {server_name}", descriptor.artifact_id),
        )
        .await?;

        Ok(ServiceAdded {
            token: token::seal(&ctx.to_payload()?, self.cipher.as_ref())?,
            target_group_arn: routing.target_group_arn,
            rule_arn: routing.rule_arn,
            reused_target_group: routing.reused_target_group,
        })
    }

    /// Full routing chain: LB ingress, target group, target, rule, tags.
    async fn deploy_new_service(
        &self,
        ctx: &WorkflowContext,
        server: &Server,
        descriptor: &ServiceDescriptor,
        target_group_name: &str,
        stack: &mut CompensationStack,
    ) -> Result<RoutingOutcome, ProvisionError> {
        let ingress_rule = ctx
            .security_group
            .authorize_loadbalancer_ingress(
                &self.settings.loadbalancer_security_group,
                descriptor.port,
            )
            .await?;
        let undo_sg = ctx.security_group.clone();
        let undo_rule = ingress_rule.clone();
        stack.push("load balancer ingress", move || async move {
            undo_sg.revoke_ingress(&undo_rule).await
        });

        let mut target_group = TargetGroup::new(
            target_group_name,
            descriptor.port,
            &descriptor.path,
            self.provider.clone(),
        );
        target_group.create(ctx.vpc.id()).await?;
        let undo = target_group.clone();
        stack.push("target group", move || async move {
            let mut target_group = undo;
            target_group.delete().await
        });
        self.status
            .send(format!("Created target group {target_group_name}"));

        let mut target = Target::new(&target_group, server, self.provider.clone())?;
        target.create().await?;
        let undo = target.clone();
        stack.push("target registration", move || async move {
            let mut target = undo;
            target.delete().await
        });

        let listener = Listener::new(&self.settings.listener_arn, self.provider.clone());
        let priority = listener.highest_priority().await? + 1;
        let mut rule = Rule::new(
            &listener,
            &target_group,
            &descriptor.path,
            priority,
            self.provider.clone(),
        )?;
        rule.create().await?;
        let undo = rule.clone();
        stack.push("listener rule", move || async move {
            let mut rule = undo;
            rule.delete().await
        });
        self.status.send(format!(
            "Routing /{} at priority {priority}",
            descriptor.path.trim_matches('/')
        ));

        let mut tags = TagSet::for_new_service(
            &descriptor.artifact_id,
            &ctx.scope,
            &ctx.key,
            &ctx.security_group,
            server,
            &target_group,
            &rule,
            &listener,
            self.provider.clone(),
        )
        .await?;
        tags.create().await?;
        let undo = tags.clone();
        stack.push("artifact tags", move || async move {
            let mut tags = undo;
            tags.delete().await
        });

        Ok(RoutingOutcome {
            target_group_arn: target_group.arn()?.to_string(),
            rule_arn: Some(rule.arn()?.to_string()),
            reused_target_group: false,
        })
    }

    /// The artifact is already routed in this scope; only register the new
    /// server into the existing target group and tag what it adds.
    async fn join_existing_service(
        &self,
        ctx: &WorkflowContext,
        server: &Server,
        descriptor: &ServiceDescriptor,
        target_group_name: &str,
        stack: &mut CompensationStack,
    ) -> Result<RoutingOutcome, ProvisionError> {
        let target_group = TargetGroup::get(target_group_name, self.provider.clone()).await?;
        self.status.send(format!(
            "Artifact {} already routed, joining target group {target_group_name}",
            descriptor.artifact_id
        ));

        let mut target = Target::new(&target_group, server, self.provider.clone())?;
        target.create().await?;
        let undo = target.clone();
        stack.push("target registration", move || async move {
            let mut target = undo;
            target.delete().await
        });

        let mut tags = TagSet::for_additional_server(
            &descriptor.artifact_id,
            &ctx.scope,
            server,
            self.provider.clone(),
        )?;
        tags.create().await?;
        let undo = tags.clone();
        stack.push("artifact tags", move || async move {
            let mut tags = undo;
            tags.delete().await
        });

        Ok(RoutingOutcome {
            target_group_arn: target_group.arn()?.to_string(),
            rule_arn: None,
            reused_target_group: true,
        })
    }
}
