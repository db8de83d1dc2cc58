//! Worker node join

use crate::validate::{self, JOIN_PREFIX};
use crate::workflow::StepContext;
use anyhow::{Context, Result};

/// Ask for the join command printed by the control plane
///
/// Only the leading `kubeadm join` is checked.
pub fn read_join_command(ctx: &StepContext) -> Result<String> {
    println!("Paste the join command printed on the control plane ({} ...)", JOIN_PREFIX);
    let pasted = ctx.prompter.prompt("Join command", "")?;
    Ok(validate::join_command(&pasted)?)
}

/// Execute the pasted join command verbatim through the shell
pub fn join_cluster(ctx: &StepContext, join_command: &str) -> Result<()> {
    ctx.host
        .run_shell(join_command)
        .context("Failed to join the cluster")?;
    println!("✓ Node joined the cluster");
    Ok(())
}
