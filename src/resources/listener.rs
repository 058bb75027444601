use tracing::warn;

use crate::provider::{ProviderHandle, ProvisionError};

/// Lookup-only handle for an existing load-balancer listener. The listener
/// itself is shared infrastructure and never created or deleted here.
#[derive(Clone)]
pub struct Listener {
    arn: String,
    handle: ProviderHandle,
}

impl Listener {
    pub fn new(arn: &str, handle: ProviderHandle) -> Self {
        Self {
            arn: arn.to_string(),
            handle,
        }
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    pub async fn load_balancer_arn(&self) -> Result<String, ProvisionError> {
        self.handle
            .load_balancer()?
            .listener_load_balancer(&self.arn)
            .await
    }

    /// Highest numeric rule priority on this listener. The provider's
    /// "default" rule is skipped; unparsable priorities are logged and
    /// skipped; an empty rule set yields 0.
    pub async fn highest_priority(&self) -> Result<u32, ProvisionError> {
        let raw = self.handle.load_balancer()?.rule_priorities(&self.arn).await?;
        let mut highest = 0u32;
        for priority in raw {
            if priority == "default" {
                continue;
            }
            match priority.parse::<u32>() {
                Ok(value) => highest = highest.max(value),
                Err(_) => {
                    warn!(listener = %self.arn, priority = %priority, "skipping unparsable rule priority");
                }
            }
        }
        Ok(highest)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::provider::api::{LoadBalancerApi, TargetGroupSpec};
    use crate::provider::memory::MemoryProvider;

    struct FixedPriorities(Vec<&'static str>);

    #[async_trait]
    impl LoadBalancerApi for FixedPriorities {
        async fn create_target_group(
            &self,
            _spec: &TargetGroupSpec,
        ) -> Result<String, ProvisionError> {
            unimplemented!()
        }
        async fn delete_target_group(&self, _arn: &str) -> Result<(), ProvisionError> {
            unimplemented!()
        }
        async fn target_group_arn(&self, _name: &str) -> Result<String, ProvisionError> {
            unimplemented!()
        }
        async fn register_target(
            &self,
            _target_group_arn: &str,
            _instance_id: &str,
        ) -> Result<(), ProvisionError> {
            unimplemented!()
        }
        async fn deregister_target(
            &self,
            _target_group_arn: &str,
            _instance_id: &str,
        ) -> Result<(), ProvisionError> {
            unimplemented!()
        }
        async fn rule_priorities(&self, _listener_arn: &str) -> Result<Vec<String>, ProvisionError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
        async fn create_rule(
            &self,
            _listener_arn: &str,
            _target_group_arn: &str,
            _path_patterns: &[String],
            _priority: u32,
        ) -> Result<String, ProvisionError> {
            unimplemented!()
        }
        async fn delete_rule(&self, _rule_arn: &str) -> Result<(), ProvisionError> {
            unimplemented!()
        }
        async fn listener_load_balancer(
            &self,
            _listener_arn: &str,
        ) -> Result<String, ProvisionError> {
            unimplemented!()
        }
        async fn add_tags(
            &self,
            _resource_arns: &[String],
            _key: &str,
            _value: &str,
        ) -> Result<(), ProvisionError> {
            unimplemented!()
        }
        async fn remove_tags(
            &self,
            _resource_arns: &[String],
            _key: &str,
        ) -> Result<(), ProvisionError> {
            unimplemented!()
        }
    }

    fn listener_with(priorities: Vec<&'static str>) -> Listener {
        let handle = ProviderHandle::new().with_load_balancer(Arc::new(FixedPriorities(priorities)));
        Listener::new("arn:mem:listener/web", handle)
    }

    #[tokio::test]
    async fn empty_rule_set_yields_zero() {
        assert_eq!(listener_with(vec![]).highest_priority().await.unwrap(), 0);
        assert_eq!(
            listener_with(vec!["default"]).highest_priority().await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn highest_of_mixed_priorities() {
        let listener = listener_with(vec!["default", "1", "2", "5"]);
        assert_eq!(listener.highest_priority().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn unparsable_priorities_are_skipped() {
        let listener = listener_with(vec!["default", "3", "not-a-number", "7"]);
        assert_eq!(listener.highest_priority().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn memory_provider_reports_default_rule_only() {
        let mem = Arc::new(MemoryProvider::new());
        let handle = ProviderHandle::new().with_load_balancer(mem);
        let listener = Listener::new("arn:mem:listener/web", handle);
        assert_eq!(listener.highest_priority().await.unwrap(), 0);
    }
}
