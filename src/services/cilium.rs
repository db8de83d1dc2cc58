//! Cilium CLI download and CNI installation

use crate::error::BootstrapError;
use crate::workflow::StepContext;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::Read;

const BINARY_NAME: &str = "cilium";

/// Map `uname -m` output to the cilium-cli release architecture
pub fn release_arch(machine: &str) -> &'static str {
    match machine.trim() {
        "aarch64" | "arm64" => "arm64",
        _ => "amd64",
    }
}

/// Install the Cilium CLI, deploy Cilium into the cluster and wait for it
pub fn install_cni(ctx: &StepContext) -> Result<()> {
    let host = ctx.host;
    let config = ctx.config;

    let tag_body = host
        .fetch(&config.cilium_stable_url)
        .context("Failed to resolve the latest stable cilium-cli release")?;
    let tag = String::from_utf8_lossy(&tag_body).trim().to_string();
    if tag.is_empty() {
        anyhow::bail!("Empty cilium-cli release tag from {}", config.cilium_stable_url);
    }

    let machine = host.capture("uname", &["-m"])?;
    let arch = release_arch(&machine);
    let archive_name = format!("cilium-linux-{}.tar.gz", arch);
    let archive_url = format!("{}/{}/{}", config.cilium_release_url, tag, archive_name);
    println!("  Downloading cilium-cli {} ({})...", tag, arch);

    let archive = host.fetch(&archive_url)?;
    let checksum = host.fetch(&format!("{}.sha256sum", archive_url))?;
    verify_checksum(&archive_name, &archive, &String::from_utf8_lossy(&checksum))?;
    println!("✓ Checksum verified for {}", archive_name);

    let binary = extract_binary(&archive_name, &archive)?;
    let target = format!("{}/{}", config.bin_dir.trim_end_matches('/'), BINARY_NAME);
    host.write_file(&target, &binary)?;
    host.set_mode(&target, 0o755)?;
    println!("✓ Installed {}", target);

    // Root has no kubeconfig of its own; point the CLI at the admin credentials
    let kubeconfig = format!("KUBECONFIG={}", config.admin_kubeconfig);
    host.run("env", &[&kubeconfig, &target, "install"])
        .context("cilium install failed")?;
    println!("  Waiting for Cilium to become ready...");
    host.run("env", &[&kubeconfig, &target, "status", "--wait"])
        .context("Cilium did not become ready")?;
    println!("✓ Cilium is ready");
    Ok(())
}

/// Compare the SHA-256 of `data` with the first field of a `sha256sum` line
fn verify_checksum(file: &str, data: &[u8], checksum_file: &str) -> Result<()> {
    let expected = checksum_file
        .split_whitespace()
        .next()
        .with_context(|| format!("Empty checksum file for {}", file))?
        .to_lowercase();
    let actual = format!("{:x}", Sha256::digest(data));

    if expected != actual {
        return Err(BootstrapError::ChecksumMismatch {
            file: file.to_string(),
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Pull the `cilium` executable out of a release tarball
fn extract_binary(archive_name: &str, archive: &[u8]) -> Result<Vec<u8>> {
    let mut tarball = tar::Archive::new(GzDecoder::new(archive));
    let entries = tarball
        .entries()
        .with_context(|| format!("Failed to read {}", archive_name))?;

    for entry in entries {
        let mut entry = entry.with_context(|| format!("Corrupt entry in {}", archive_name))?;
        let is_binary = entry
            .path()
            .ok()
            .and_then(|p| p.file_name().map(|n| n == BINARY_NAME))
            .unwrap_or(false);
        if is_binary && entry.header().entry_type().is_file() {
            let mut binary = Vec::new();
            entry
                .read_to_end(&mut binary)
                .with_context(|| format!("Failed to extract {} from {}", BINARY_NAME, archive_name))?;
            return Ok(binary);
        }
    }

    Err(BootstrapError::MissingArchiveEntry {
        archive: archive_name.to_string(),
        entry: BINARY_NAME.to_string(),
    }
    .into())
}
