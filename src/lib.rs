// stackhand: provisioning orchestration for chains of dependent cloud
// resources. Multi-step workflows run strictly in order, every create pushes
// its undo onto a LIFO compensation stack, and the state a follow-up call
// needs travels in a sealed continuation token instead of server-side state.

pub mod compensation;
pub mod config;
pub mod coordinator;
pub mod install;
pub mod notify;
pub mod provider;
pub mod resources;
pub mod telemetry;
pub mod token;

pub use compensation::CompensationStack;
pub use config::StackhandConfig;
pub use coordinator::{Coordinator, ProvisionSettings, ServiceDescriptor};
pub use provider::{ProviderHandle, ProvisionError};
pub use token::{Cipher, PlainCipher};
