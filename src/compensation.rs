// LIFO rollback stack. One stack lives per workflow invocation: every
// successful create pushes its undo before the next dependent step runs, so
// the stack always mirrors what exists. Success discards the stack undrained;
// failure drains it to empty before the invocation returns.

use std::future::Future;
use std::pin::Pin;

use tracing::{error, info};

use crate::provider::ProvisionError;

type RollbackFuture = Pin<Box<dyn Future<Output = Result<(), ProvisionError>> + Send>>;
type RollbackFn = Box<dyn FnOnce() -> RollbackFuture + Send>;

pub struct CompensationEntry {
    label: String,
    action: RollbackFn,
}

impl CompensationEntry {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn run(self) -> Result<(), ProvisionError> {
        (self.action)().await
    }
}

/// Outcome of a drain. A drain never short-circuits: `attempted` always
/// equals the number of entries that were on the stack.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub attempted: u32,
    pub failures: Vec<(String, ProvisionError)>,
}

#[derive(Default)]
pub struct CompensationStack {
    entries: Vec<CompensationEntry>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push<F, Fut>(&mut self, label: &str, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ProvisionError>> + Send + 'static,
    {
        self.entries.push(CompensationEntry {
            label: label.to_string(),
            action: Box::new(move || Box::pin(action())),
        });
    }

    pub fn pop(&mut self) -> Option<CompensationEntry> {
        self.entries.pop()
    }

    /// Pop and run every entry, newest first. `before` is called with each
    /// entry's label before it runs, for progress reporting. A failing action
    /// is logged and recorded but never stops the drain.
    pub async fn drain_with(mut self, mut before: impl FnMut(&str)) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(entry) = self.pop() {
            report.attempted += 1;
            before(entry.label());
            let label = entry.label().to_string();
            match entry.run().await {
                Ok(()) => info!(step = %label, "rolled back"),
                Err(err) => {
                    error!(step = %label, error = %err, "rollback failed, continuing drain");
                    report.failures.push((label, err));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn drains_in_reverse_push_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = CompensationStack::new();
        for label in ["a", "b", "c"] {
            let order = order.clone();
            stack.push(label, move || async move {
                order.lock().unwrap().push(label);
                Ok(())
            });
        }
        let report = stack.drain_with(|_| {}).await;
        assert_eq!(report.attempted, 3);
        assert!(report.failures.is_empty());
        assert_eq!(*order.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn failing_entry_does_not_stop_the_drain() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = CompensationStack::new();
        {
            let order = order.clone();
            stack.push("first", move || async move {
                order.lock().unwrap().push("first");
                Ok(())
            });
        }
        stack.push("exploding", || async {
            Err(ProvisionError::api("delete", "gone sideways"))
        });
        {
            let order = order.clone();
            stack.push("last", move || async move {
                order.lock().unwrap().push("last");
                Ok(())
            });
        }

        let report = stack.drain_with(|_| {}).await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "exploding");
        assert_eq!(*order.lock().unwrap(), vec!["last", "first"]);
    }

    #[tokio::test]
    async fn pop_on_empty_returns_none() {
        let mut stack = CompensationStack::new();
        assert!(stack.pop().is_none());
        assert!(stack.is_empty());
        let report = stack.drain_with(|_| panic!("nothing to announce")).await;
        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn before_hook_sees_labels_in_drain_order() {
        let mut stack = CompensationStack::new();
        stack.push("Key pair", || async { Ok(()) });
        stack.push("Security group", || async { Ok(()) });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_hook = seen.clone();
        stack
            .drain_with(move |label| seen_in_hook.lock().unwrap().push(label.to_string()))
            .await;
        assert_eq!(*seen.lock().unwrap(), vec!["Security group", "Key pair"]);
    }
}
