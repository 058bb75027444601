// Per-kind resource lifecycle handles. Every handle guards Create with an
// internal created flag and makes Delete a no-op when this invocation never
// created the resource, so compensation closures can be pushed unconditionally.

pub mod database;
pub mod key_pair;
pub mod listener;
pub mod rule;
pub mod security_group;
pub mod server;
pub mod tags;
pub mod target;
pub mod target_group;
pub mod vpc;
pub mod wait;

pub use database::Database;
pub use key_pair::{KeyPair, KeyRecord};
pub use listener::Listener;
pub use rule::Rule;
pub use security_group::{GroupRecord, SecurityGroup};
pub use server::Server;
pub use tags::TagSet;
pub use target::Target;
pub use target_group::TargetGroup;
pub use vpc::Vpc;
