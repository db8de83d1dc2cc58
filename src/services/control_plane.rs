//! Control plane initialization

use crate::utils::networking;
use crate::validate;
use crate::workflow::StepContext;
use anyhow::{Context, Result};

/// Values `kubeadm init` needs from the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPlaneInputs {
    pub advertise_address: String,
    pub pod_cidr: String,
    pub service_cidr: String,
}

/// Ask for the advertise address and network ranges
///
/// Empty answers take the computed defaults. The first invalid answer ends
/// the run; there is no re-prompt.
pub fn collect_inputs(ctx: &StepContext) -> Result<ControlPlaneInputs> {
    let detected_ip = networking::primary_ipv4(ctx.host).unwrap_or_default();
    if detected_ip.is_empty() {
        eprintln!("⚠ Could not detect this host's primary IP; please enter it.");
    }

    let advertise_address = ctx
        .prompter
        .prompt("API server advertise address", &detected_ip)?;
    let advertise_address = validate::ipv4("advertise address", &advertise_address)?;

    let pod_cidr = ctx
        .prompter
        .prompt("Pod network CIDR", &ctx.config.default_pod_cidr)?;
    let pod_cidr = validate::cidr("pod network CIDR", &pod_cidr)?;

    let service_cidr = ctx
        .prompter
        .prompt("Service CIDR", &ctx.config.default_service_cidr)?;
    let service_cidr = validate::cidr("service CIDR", &service_cidr)?;

    Ok(ControlPlaneInputs {
        advertise_address,
        pod_cidr,
        service_cidr,
    })
}

/// Run `kubeadm init` without kube-proxy; Cilium replaces it
pub fn init_cluster(ctx: &StepContext, inputs: &ControlPlaneInputs) -> Result<()> {
    let advertise = format!("--apiserver-advertise-address={}", inputs.advertise_address);
    let pod_cidr = format!("--pod-network-cidr={}", inputs.pod_cidr);
    let service_cidr = format!("--service-cidr={}", inputs.service_cidr);

    ctx.host
        .run(
            "kubeadm",
            &[
                "init",
                &advertise,
                &pod_cidr,
                &service_cidr,
                "--skip-phases=addon/kube-proxy",
            ],
        )
        .context("kubeadm init failed")?;
    println!("✓ Control plane initialized at {}", inputs.advertise_address);
    Ok(())
}

/// Create a non-expiring bootstrap token and print the matching join command
pub fn print_join_command(ctx: &StepContext) -> Result<()> {
    let join = ctx
        .host
        .capture(
            "kubeadm",
            &["token", "create", "--print-join-command", "--ttl", "0"],
        )
        .context("Failed to create join token")?;

    println!();
    println!("Run this on each worker node to join the cluster:");
    println!();
    println!("  {}", join);
    println!();
    Ok(())
}

/// The account that invoked the installer, looking through sudo
#[derive(Debug, Clone, PartialEq, Eq)]
struct InvokingUser {
    name: String,
    home: String,
}

fn invoking_user(ctx: &StepContext) -> Result<InvokingUser> {
    let sudo_user = ctx
        .host
        .env_var("SUDO_USER")
        .filter(|user| !user.is_empty() && user != "root");

    match sudo_user {
        Some(name) => {
            let entry = ctx
                .host
                .capture("getent", &["passwd", &name])
                .with_context(|| format!("Failed to look up user {}", name))?;
            let home = entry
                .split(':')
                .nth(5)
                .filter(|home| !home.is_empty())
                .map(str::to_string)
                .with_context(|| format!("No home directory for user {}", name))?;
            Ok(InvokingUser { name, home })
        }
        None => {
            let name = ctx.host.username();
            let home = ctx
                .host
                .env_var("HOME")
                .filter(|home| !home.is_empty())
                .unwrap_or_else(|| "/root".to_string());
            Ok(InvokingUser { name, home })
        }
    }
}

/// Copy the admin kubeconfig into the invoking user's `~/.kube/config`
pub fn configure_kubeconfig(ctx: &StepContext) -> Result<()> {
    let user = invoking_user(ctx)?;
    let kube_dir = format!("{}/.kube", user.home.trim_end_matches('/'));
    let kube_config = format!("{}/config", kube_dir);

    let admin = ctx
        .host
        .read_file(&ctx.config.admin_kubeconfig)
        .context("Failed to read the admin kubeconfig")?;
    ctx.host.mkdir_p(&kube_dir)?;
    ctx.host.write_file(&kube_config, admin.as_bytes())?;
    ctx.host.set_mode(&kube_config, 0o600)?;

    // `user:` assigns the user's login group
    let owner = format!("{}:", user.name);
    ctx.host.run("chown", &["-R", &owner, &kube_dir])?;
    println!("✓ kubectl configured for {} at {}", user.name, kube_config);
    Ok(())
}
