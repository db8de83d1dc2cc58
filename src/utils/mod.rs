// Utils module - host access and small helpers shared by the services
pub mod exec;
#[cfg(test)]
pub mod fake;
pub mod networking;
pub mod string;

pub use exec::{DryRunHost, HostEnvironment, LocalHost};
