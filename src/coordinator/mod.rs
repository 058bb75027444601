// Sequence coordinator: runs each provisioning workflow strictly in order,
// pushing one compensation per successful create before the next dependent
// step. Any error drains the stack so the caller sees full success or a
// clean slate, never a half-provisioned scope.

pub mod context;
pub mod naming;

mod add_server;
mod add_service;
mod create_database;
mod create_scope;

use std::sync::Arc;

use crate::compensation::CompensationStack;
use crate::install::RemoteInstaller;
use crate::notify::{Notifier, StatusSender};
use crate::provider::ProviderHandle;
use crate::token::Cipher;

pub use add_server::ServerAdded;
pub use add_service::ServiceAdded;
pub use context::{ServiceDescriptor, WorkflowContext};
pub use create_database::DatabaseCreated;
pub use create_scope::ScopeCreated;

/// Environment-level knobs the workflows need: which image and instance type
/// servers launch with, and which shared load-balancer listener services are
/// wired into.
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub image_id: String,
    pub instance_type: String,
    pub listener_arn: String,
    pub loadbalancer_security_group: String,
}

pub struct Coordinator {
    provider: ProviderHandle,
    cipher: Arc<dyn Cipher>,
    notifier: Arc<dyn Notifier>,
    installer: Arc<dyn RemoteInstaller>,
    status: StatusSender,
    settings: ProvisionSettings,
}

impl Coordinator {
    /// All collaborators are injected once at bootstrap; the coordinator
    /// itself holds no state between invocations.
    pub fn new(
        provider: ProviderHandle,
        cipher: Arc<dyn Cipher>,
        notifier: Arc<dyn Notifier>,
        installer: Arc<dyn RemoteInstaller>,
        status: StatusSender,
        settings: ProvisionSettings,
    ) -> Self {
        Self {
            provider,
            cipher,
            notifier,
            installer,
            status,
            settings,
        }
    }

    /// Deliver a workflow result, continuing the caller's notification
    /// thread when one travels in the token. The backend may hand back a new
    /// thread id; the updated id goes into the resealed token.
    pub(crate) async fn send_result(
        &self,
        thread_id: &mut Option<String>,
        text: String,
    ) -> Result<(), crate::provider::ProvisionError> {
        if let Some(id) = thread_id.take() {
            let new_id = self.notifier.send_followup(&text, &id).await?;
            *thread_id = Some(new_id);
        } else {
            self.status.send(text);
        }
        Ok(())
    }

    /// Best-effort reverse-order cleanup after a failed workflow. Reports
    /// every attempt; a failing delete never stops the drain.
    pub(crate) async fn rollback(&self, stack: CompensationStack) {
        if stack.is_empty() {
            return;
        }
        self.status.send("Provisioning failed, rolling back what was created");
        let status = self.status.clone();
        let report = stack
            .drain_with(|label| status.send(format!("Cleaning up: {label}")))
            .await;
        if !report.failures.is_empty() {
            self.status.send(format!(
                "{} cleanup step(s) failed and may need manual attention",
                report.failures.len()
            ));
        }
    }
}
