// kubestrap library
// Turns a bare Ubuntu host into a Kubernetes control plane or worker node

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod prompt;
pub mod services;
pub mod utils;
pub mod validate;
pub mod workflow;

pub use bootstrap::NodeRole;
pub use config::NodeConfig;
pub use error::BootstrapError;
