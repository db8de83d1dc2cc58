//! containerd installation and cgroup driver configuration

use crate::services::apt;
use crate::workflow::StepContext;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static SYSTEMD_CGROUP_OFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SystemdCgroup\s*=\s*false").expect("valid SystemdCgroup pattern")
});

/// Install containerd, switch it to the systemd cgroup driver and start it
pub fn setup_container_runtime(ctx: &StepContext) -> Result<()> {
    let host = ctx.host;
    let config_path = ctx.config.containerd_config_path.as_str();

    apt::install(host, std::slice::from_ref(&ctx.config.runtime_package))?;

    if let Some(dir) = Path::new(config_path).parent().and_then(Path::to_str) {
        host.mkdir_p(dir)?;
    }
    let default_config = host
        .capture("containerd", &["config", "default"])
        .context("Failed to generate default containerd configuration")?;

    let (patched, replaced) = enable_systemd_cgroup(&default_config);
    if replaced == 0 {
        eprintln!(
            "⚠ SystemdCgroup = false not found in the default containerd config; leaving it unchanged"
        );
    }
    let mut content = patched;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    host.write_file(config_path, content.as_bytes())?;

    host.run("systemctl", &["restart", "containerd"])?;
    host.run("systemctl", &["enable", "containerd"])?;
    println!("✓ containerd configured with the systemd cgroup driver");
    Ok(())
}

/// Flip `SystemdCgroup = false` to `true`, returning the new text and the number of edits
fn enable_systemd_cgroup(config: &str) -> (String, usize) {
    let replaced = SYSTEMD_CGROUP_OFF.find_iter(config).count();
    let patched = SYSTEMD_CGROUP_OFF
        .replace_all(config, "SystemdCgroup = true")
        .into_owned();
    (patched, replaced)
}
