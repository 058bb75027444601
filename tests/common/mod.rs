#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use stackhand::coordinator::{Coordinator, ProvisionSettings};
use stackhand::install::NoopInstaller;
use stackhand::notify::{spawn_status_batcher, Notifier};
use stackhand::provider::memory::MemoryProvider;
use stackhand::provider::{ProviderHandle, ProvisionError};
use stackhand::token::PlainCipher;

pub const LISTENER_ARN: &str = "arn:mem:listener/web";
pub const LB_SECURITY_GROUP: &str = "sg-loadbalancer";

/// Notifier that records every delivered message.
#[derive(Default)]
pub struct CollectingNotifier {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn send_status(&self, text: &str) -> Result<(), ProvisionError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_followup(&self, text: &str, thread_id: &str) -> Result<String, ProvisionError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(thread_id.to_string())
    }

    async fn send_command(&self, _endpoint: &str, body: &str) -> Result<(), ProvisionError> {
        self.messages.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub memory: Arc<MemoryProvider>,
    pub notifier: Arc<CollectingNotifier>,
    pub coordinator: Coordinator,
    batcher: JoinHandle<()>,
}

pub fn settings() -> ProvisionSettings {
    ProvisionSettings {
        image_id: "ami-test".to_string(),
        instance_type: "t3.micro".to_string(),
        listener_arn: LISTENER_ARN.to_string(),
        loadbalancer_security_group: LB_SECURITY_GROUP.to_string(),
    }
}

pub fn harness() -> Harness {
    let memory = Arc::new(MemoryProvider::new());
    let provider = ProviderHandle::new()
        .with_compute(memory.clone())
        .with_load_balancer(memory.clone())
        .with_database(memory.clone());
    let notifier = Arc::new(CollectingNotifier::default());
    let (status, batcher) =
        spawn_status_batcher(notifier.clone(), Duration::from_millis(10), 50);
    let coordinator = Coordinator::new(
        provider,
        Arc::new(PlainCipher),
        notifier.clone(),
        Arc::new(NoopInstaller),
        status,
        settings(),
    );
    Harness {
        memory,
        notifier,
        coordinator,
        batcher,
    }
}

impl Harness {
    /// Number of times the named provider operation was invoked.
    pub fn call_count(&self, op: &str) -> usize {
        self.memory.calls().iter().filter(|c| c.as_str() == op).count()
    }
}
