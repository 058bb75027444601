pub mod api;
pub mod client;
pub mod error;
pub mod memory;

pub use api::{ComputeApi, DatabaseApi, LoadBalancerApi};
pub use client::ProviderHandle;
pub use error::ProvisionError;
