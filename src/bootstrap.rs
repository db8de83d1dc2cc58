//! Node bootstrap pipeline
//!
//! Shared host preparation runs first, then the operator picks a role and the
//! matching role workflow runs.

use crate::error::BootstrapError;
use crate::services::control_plane::{self, ControlPlaneInputs};
use crate::services::{apt, cilium, containerd, kubernetes, system, worker};
use crate::workflow::{StepContext, Workflow, banner};
use anyhow::Result;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    ControlPlane,
    Worker,
}

impl FromStr for NodeRole {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(NodeRole::ControlPlane),
            "2" => Ok(NodeRole::Worker),
            other => Err(BootstrapError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::ControlPlane => write!(f, "control plane"),
            NodeRole::Worker => write!(f, "worker"),
        }
    }
}

/// Steps every node runs regardless of role
pub fn prepare_node() -> Workflow {
    Workflow::new("Preparing node")
        .step("Preflight checks", system::preflight)
        .step("Disable swap", system::disable_swap)
        .step("Load kernel modules", system::load_kernel_modules)
        .step("Apply kernel parameters", system::apply_sysctl)
        .step("Install prerequisites", apt::install_prerequisites)
        .step("Set up containerd", containerd::setup_container_runtime)
        .step("Register Kubernetes repository", kubernetes::register_repository)
        .step("Install Kubernetes packages", kubernetes::install_packages)
}

pub fn control_plane_steps(inputs: ControlPlaneInputs) -> Workflow {
    Workflow::new("Initializing control plane")
        .step("Initialize cluster", move |ctx| {
            control_plane::init_cluster(ctx, &inputs)
        })
        .step("Print join command", control_plane::print_join_command)
        .step("Configure kubectl", control_plane::configure_kubeconfig)
        .step("Install Cilium", cilium::install_cni)
}

pub fn worker_steps(join_command: String) -> Workflow {
    Workflow::new("Joining cluster").step("Join cluster", move |ctx| {
        worker::join_cluster(ctx, &join_command)
    })
}

/// Ask which role this node plays
pub fn select_role(ctx: &StepContext) -> Result<NodeRole> {
    banner("Node role");
    println!("  1) Control plane");
    println!("  2) Worker");
    println!();
    let answer = ctx.prompter.prompt("Select node role", "")?;
    Ok(answer.parse::<NodeRole>()?)
}

/// Run the full bootstrap against `ctx`
pub fn run(ctx: &StepContext) -> Result<NodeRole> {
    prepare_node().run(ctx)?;

    let role = select_role(ctx)?;
    tracing::info!(%role, "role selected");

    match role {
        NodeRole::ControlPlane => {
            let inputs = control_plane::collect_inputs(ctx)?;
            control_plane_steps(inputs).run(ctx)?;
            println!("✓ Control plane is ready");
        }
        NodeRole::Worker => {
            let join_command = worker::read_join_command(ctx)?;
            worker_steps(join_command).run(ctx)?;
            println!("✓ Worker node joined");
        }
    }
    Ok(role)
}
