use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::provider::api::DbInstanceSpec;
use crate::provider::{ProviderHandle, ProvisionError};
use crate::resources::wait;

const STORAGE_GB: u32 = 8;
const PASSWORD_LEN: usize = 48;
const ENDPOINT_ATTEMPTS: u32 = 20;
const ENDPOINT_INTERVAL: Duration = Duration::from_secs(30);

/// Single managed database instance for a scope, identified as
/// `{scope}-{name}-db`. The master password is generated here and only ever
/// reported back through the notifier.
#[derive(Clone)]
pub struct Database {
    name: String,
    identifier: String,
    password: String,
    security_group_id: String,
    endpoint: Option<String>,
    handle: ProviderHandle,
    created: bool,
}

impl Database {
    pub fn new(scope: &str, name: &str, security_group_id: &str, handle: ProviderHandle) -> Self {
        Self {
            name: name.to_string(),
            identifier: format!("{scope}-{name}-db"),
            password: random_base32(PASSWORD_LEN),
            security_group_id: security_group_id.to_string(),
            endpoint: None,
            handle,
            created: false,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn endpoint(&self) -> Result<&str, ProvisionError> {
        self.endpoint.as_deref().ok_or_else(|| {
            ProvisionError::Validation(format!("database {} has no endpoint yet", self.identifier))
        })
    }

    pub async fn create(&mut self) -> Result<(), ProvisionError> {
        if self.created {
            return Err(ProvisionError::Validation(format!(
                "database {} already created in this invocation",
                self.identifier
            )));
        }
        let spec = DbInstanceSpec {
            identifier: self.identifier.clone(),
            database: self.name.clone(),
            master_password: self.password.clone(),
            security_group_id: self.security_group_id.clone(),
            storage_gb: STORAGE_GB,
        };
        self.handle.database()?.create_db_instance(&spec).await?;
        info!(database = %self.identifier, "created database instance");
        self.created = true;
        Ok(())
    }

    /// Poll until the provider assigns an endpoint. Database provisioning is
    /// slow, so this waits on a longer interval than the compute waits.
    pub async fn wait_for_endpoint(&mut self) -> Result<(), ProvisionError> {
        let rds = self.handle.database()?.clone();
        let identifier = self.identifier.clone();
        let endpoint = wait::poll_until(
            "database endpoint",
            ENDPOINT_ATTEMPTS,
            ENDPOINT_INTERVAL,
            || {
                let rds = rds.clone();
                let identifier = identifier.clone();
                async move { rds.db_endpoint(&identifier).await }
            },
        )
        .await?;
        self.endpoint = Some(endpoint);
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<(), ProvisionError> {
        if !self.created {
            return Ok(());
        }
        self.handle
            .database()?
            .delete_db_instance(&self.identifier)
            .await?;
        info!(database = %self.identifier, "deleted database instance");
        self.created = false;
        Ok(())
    }
}

/// Random string over the base32 alphabet, suitable for a master password.
fn random_base32(len: usize) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
