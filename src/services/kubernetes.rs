//! pkgs.k8s.io repository registration and kubelet/kubeadm/kubectl install

use crate::services::apt;
use crate::workflow::StepContext;
use anyhow::{Context, Result};
use std::path::Path;

/// Import the repository signing key and write the apt source entry
pub fn register_repository(ctx: &StepContext) -> Result<()> {
    let host = ctx.host;
    let config = ctx.config;
    let key_url = config.kubernetes_key_url();

    println!("  Fetching signing key for Kubernetes {}...", config.kubernetes_version);
    let key = host
        .fetch(&key_url)
        .with_context(|| format!("Failed to fetch Kubernetes signing key from {}", key_url))?;

    if let Some(dir) = Path::new(&config.keyring_path).parent().and_then(Path::to_str) {
        host.mkdir_p(dir)?;
    }
    host.pipe(
        "gpg",
        &["--batch", "--yes", "--dearmor", "-o", &config.keyring_path],
        &key,
    )
    .context("Failed to import Kubernetes signing key")?;

    host.write_file(&config.apt_source_path, source_entry(config).as_bytes())?;
    println!("✓ Registered {}", config.kubernetes_repo_url());
    Ok(())
}

fn source_entry(config: &crate::config::NodeConfig) -> String {
    format!(
        "deb [signed-by={}] {} /\n",
        config.keyring_path,
        config.kubernetes_repo_url()
    )
}

/// Install, hold and enable the Kubernetes node packages
pub fn install_packages(ctx: &StepContext) -> Result<()> {
    let host = ctx.host;
    let packages = &ctx.config.kubernetes_packages;

    apt::update(host)?;
    apt::install(host, packages)?;
    apt::hold(host, packages)?;
    host.run("systemctl", &["enable", "--now", "kubelet"])?;
    println!("✓ Installed and held: {}", packages.join(" "));
    Ok(())
}
