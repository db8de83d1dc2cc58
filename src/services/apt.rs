//! apt-get wrappers

use crate::utils::exec::HostEnvironment;
use anyhow::Result;

pub fn update(host: &dyn HostEnvironment) -> Result<()> {
    host.run("apt-get", &["update"])
}

pub fn install(host: &dyn HostEnvironment, packages: &[String]) -> Result<()> {
    let mut args = vec!["install", "-y"];
    args.extend(packages.iter().map(String::as_str));
    host.run("apt-get", &args)
}

/// Pin packages at their installed version
pub fn hold(host: &dyn HostEnvironment, packages: &[String]) -> Result<()> {
    let mut args = vec!["hold"];
    args.extend(packages.iter().map(String::as_str));
    host.run("apt-mark", &args)
}

/// Refresh the index and install the base tooling
pub fn install_prerequisites(ctx: &crate::workflow::StepContext) -> Result<()> {
    update(ctx.host)?;
    install(ctx.host, &ctx.config.prerequisite_packages)?;
    println!(
        "✓ Installed prerequisites: {}",
        ctx.config.prerequisite_packages.join(" ")
    );
    Ok(())
}
