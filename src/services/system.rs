//! Preflight and kernel-level host preparation

use crate::error::BootstrapError;
use crate::workflow::StepContext;
use anyhow::{Context, Result};

/// Refuse to continue unless running as root
pub fn preflight(ctx: &StepContext) -> Result<()> {
    if !ctx.host.is_root() {
        return Err(BootstrapError::NotRoot.into());
    }
    if !ctx.host.command_exists("apt-get") {
        eprintln!("⚠ apt-get not found; this installer targets Ubuntu and will likely fail.");
    }
    println!("✓ Running as root");
    Ok(())
}

/// Turn swap off now and keep it off across reboots
pub fn disable_swap(ctx: &StepContext) -> Result<()> {
    ctx.host.run("swapoff", &["-a"])?;

    let fstab_path = ctx.config.fstab_path.as_str();
    if !ctx.host.file_exists(fstab_path) {
        println!("✓ Swap disabled ({} not present)", fstab_path);
        return Ok(());
    }

    let fstab = ctx.host.read_file(fstab_path)?;
    match comment_out_swap(&fstab) {
        Some(updated) => {
            let backup = format!(
                "{}.{}.bak",
                fstab_path,
                chrono::Local::now().format("%Y%m%d%H%M%S")
            );
            ctx.host
                .write_file(&backup, fstab.as_bytes())
                .with_context(|| format!("Failed to back up {}", fstab_path))?;
            ctx.host.write_file(fstab_path, updated.as_bytes())?;
            println!("✓ Swap disabled; swap entries commented out (backup: {})", backup);
        }
        None => println!("✓ Swap disabled; no active swap entries in {}", fstab_path),
    }
    Ok(())
}

/// Comment out active swap entries, returning `None` when nothing changes
fn comment_out_swap(fstab: &str) -> Option<String> {
    let mut changed = false;
    let mut lines: Vec<String> = fstab
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let is_swap = !trimmed.starts_with('#')
                && trimmed.split_whitespace().any(|field| field == "swap");
            if is_swap {
                changed = true;
                format!("#{}", line)
            } else {
                line.to_string()
            }
        })
        .collect();

    if !changed {
        return None;
    }
    if fstab.ends_with('\n') {
        lines.push(String::new());
    }
    Some(lines.join("\n"))
}

/// Persist the module list and load each module now
pub fn load_kernel_modules(ctx: &StepContext) -> Result<()> {
    let modules = &ctx.config.kernel_modules;
    let mut content = modules.join("\n");
    content.push('\n');
    ctx.host.write_file(&ctx.config.modules_file, content.as_bytes())?;

    for module in modules {
        ctx.host.run("modprobe", &[module.as_str()])?;
    }
    println!("✓ Kernel modules loaded: {}", modules.join(", "));
    Ok(())
}

/// Persist the networking sysctls and apply them
pub fn apply_sysctl(ctx: &StepContext) -> Result<()> {
    let content: String = ctx
        .config
        .sysctl_settings
        .iter()
        .map(|(key, value)| format!("{} = {}\n", key, value))
        .collect();
    ctx.host.write_file(&ctx.config.sysctl_file, content.as_bytes())?;
    ctx.host.run("sysctl", &["--system"])?;
    println!("✓ Kernel parameters applied");
    Ok(())
}
