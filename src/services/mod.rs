//! Host preparation and cluster setup steps
//!
//! Each public step function takes a [`StepContext`](crate::workflow::StepContext)
//! and performs one stage of the node bootstrap.

pub mod apt;
pub mod cilium;
pub mod containerd;
pub mod control_plane;
pub mod kubernetes;
pub mod system;
pub mod worker;
