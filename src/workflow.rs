//! Ordered, fail-fast step runner

use crate::config::NodeConfig;
use crate::prompt::Prompter;
use crate::utils::exec::HostEnvironment;
use anyhow::{Context, Result};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// What every step gets to work with
pub struct StepContext<'a> {
    pub host: &'a dyn HostEnvironment,
    pub prompter: &'a dyn Prompter,
    pub config: &'a NodeConfig,
}

type Action = Box<dyn Fn(&StepContext<'_>) -> Result<()>>;

pub struct Step {
    name: &'static str,
    action: Action,
}

impl Step {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A titled list of steps run in order
pub struct Workflow {
    title: &'static str,
    steps: Vec<Step>,
}

impl Workflow {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            steps: Vec::new(),
        }
    }

    pub fn step(
        mut self,
        name: &'static str,
        action: impl Fn(&StepContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        self.steps.push(Step {
            name,
            action: Box::new(action),
        });
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step, stopping at the first failure
    ///
    /// The returned error carries the failing step's name as context.
    pub fn run(&self, ctx: &StepContext<'_>) -> Result<()> {
        banner(self.title);

        let total = self.steps.len();
        for (index, step) in self.steps.iter().enumerate() {
            println!("[{}/{}] {}...", index + 1, total, step.name);
            tracing::info!(workflow = self.title, step = step.name, "starting step");

            if let Err(err) = (step.action)(ctx) {
                eprintln!("✗ {} failed", step.name);
                tracing::error!(step = step.name, error = %err, "step failed");
                return Err(err).with_context(|| format!("Step '{}' failed", step.name));
            }

            tracing::info!(step = step.name, "step finished");
        }

        println!();
        Ok(())
    }
}

/// Print a ruled section header
pub fn banner(title: &str) {
    println!("{}", RULE);
    println!("{}", title);
    println!("{}", RULE);
    println!();
}
