use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::notify::Notifier;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_BUFFER_CAPACITY: usize = 50;

const MAX_DELIVERY_FAILURES: u32 = 3;

/// Non-blocking producer side of the status batcher. Sending never waits:
/// when the buffer is full the line is dropped with a warning, because
/// notification backpressure must never stall provisioning.
#[derive(Clone)]
pub struct StatusSender {
    tx: mpsc::Sender<String>,
}

impl StatusSender {
    pub fn send(&self, line: impl Into<String>) {
        let line = line.into();
        if let Err(err) = self.tx.try_send(line) {
            warn!(error = %err, "status buffer full, dropping line");
        }
    }
}

/// Spawn the single consumer that coalesces queued status lines into one
/// message per tick. A batch that fails delivery is kept and retried on the
/// next tick; after three consecutive failures it is discarded.
pub fn spawn_status_batcher(
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    capacity: usize,
) -> (StatusSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<String>(capacity);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pending: Vec<String> = Vec::new();
        let mut failures = 0u32;
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(line) => pending.push(line),
                    None => {
                        // Producers are gone; flush what is left and stop.
                        if !pending.is_empty() {
                            let batch = pending.join("\n");
                            if let Err(err) = notifier.send_status(&batch).await {
                                warn!(error = %err, "final status flush failed");
                            }
                        }
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if pending.is_empty() {
                        continue;
                    }
                    let batch = pending.join("\n");
                    match notifier.send_status(&batch).await {
                        Ok(()) => {
                            pending.clear();
                            failures = 0;
                        }
                        Err(err) => {
                            failures += 1;
                            warn!(error = %err, failures, "status delivery failed");
                            if failures >= MAX_DELIVERY_FAILURES {
                                warn!(lines = pending.len(), "discarding undeliverable status batch");
                                pending.clear();
                                failures = 0;
                            }
                        }
                    }
                }
            }
        }
    });
    (StatusSender { tx }, handle)
}
