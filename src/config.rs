use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::coordinator::ProvisionSettings;

/// Main configuration structure for stackhand.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StackhandConfig {
    pub provider: ProviderConfig,
    pub loadbalancer: LoadBalancerConfig,
    pub notify: NotifyConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider region the clients are bound to.
    pub region: String,
    /// Image every server launches from.
    pub image_id: String,
    /// Instance type for servers.
    pub instance_type: String,
    /// "memory" runs everything against the in-process provider.
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadBalancerConfig {
    /// Shared listener services are routed through.
    pub listener_arn: String,
    /// Security group of the load balancer, source of service ingress.
    pub security_group: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Seconds between status batch flushes.
    pub status_flush_seconds: u64,
    /// Bounded status buffer; overflow drops lines.
    pub buffer_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for StackhandConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                region: "eu-west-1".to_string(),
                image_id: "ami-0dd555eb".to_string(),
                instance_type: "t3.micro".to_string(),
                mode: "memory".to_string(),
            },
            loadbalancer: LoadBalancerConfig {
                listener_arn: "arn:mem:listener/web".to_string(),
                security_group: "sg-loadbalancer".to_string(),
            },
            notify: NotifyConfig {
                status_flush_seconds: 5,
                buffer_capacity: 50,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl StackhandConfig {
    /// Load configuration with precedence: defaults, then `stackhand.toml`,
    /// then `STACKHAND_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .add_source(Config::try_from(&defaults)?);

        if Path::new("stackhand.toml").exists() {
            builder = builder.add_source(File::with_name("stackhand"));
        }

        builder = builder.add_source(
            Environment::with_prefix("STACKHAND")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load .env file if it exists.
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            image_id: self.provider.image_id.clone(),
            instance_type: self.provider.instance_type.clone(),
            listener_arn: self.loadbalancer.listener_arn.clone(),
            loadbalancer_security_group: self.loadbalancer.security_group.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = StackhandConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackhand.toml");
        config.save_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: StackhandConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.provider.mode, "memory");
        assert_eq!(parsed.notify.buffer_capacity, 50);
    }
}
