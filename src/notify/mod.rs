// Notification verbs the engine depends on. Concrete chat/webhook delivery
// lives behind this trait; the batcher below coalesces progress lines so a
// chatty workflow does not turn into a message flood.

pub mod batcher;

use async_trait::async_trait;
use tracing::info;

use crate::provider::ProvisionError;

pub use batcher::{spawn_status_batcher, StatusSender};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget progress line on the default channel.
    async fn send_status(&self, text: &str) -> Result<(), ProvisionError>;

    /// Threaded follow-up. Returns the thread id to continue under, which may
    /// differ from the one passed in when the backend started a new thread.
    async fn send_followup(&self, text: &str, thread_id: &str)
        -> Result<String, ProvisionError>;

    /// Direct reply to a command endpoint, outside any thread.
    async fn send_command(&self, endpoint: &str, body: &str) -> Result<(), ProvisionError>;
}

/// Notifier that only writes to the log. Backs dry runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_status(&self, text: &str) -> Result<(), ProvisionError> {
        info!(target: "notify", "{text}");
        Ok(())
    }

    async fn send_followup(&self, text: &str, thread_id: &str) -> Result<String, ProvisionError> {
        info!(target: "notify", thread = %thread_id, "{text}");
        Ok(thread_id.to_string())
    }

    async fn send_command(&self, endpoint: &str, body: &str) -> Result<(), ProvisionError> {
        info!(target: "notify", endpoint = %endpoint, "{body}");
        Ok(())
    }
}
