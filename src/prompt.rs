//! Interactive input

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Source of operator answers
pub trait Prompter {
    /// Ask for `name`; an empty answer yields `default`
    fn prompt(&self, name: &str, default: &str) -> Result<String>;
}

/// Reads answers from the terminal
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&self, name: &str, default: &str) -> Result<String> {
        if default.is_empty() {
            print!("{}: ", name);
        } else {
            print!("{} [{}]: ", name, default);
        }
        io::stdout().flush()?;

        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read from stdin")?;
        if read == 0 {
            anyhow::bail!("stdin closed while waiting for: {}", name);
        }
        Ok(answer_or_default(&input, default))
    }
}

fn answer_or_default(input: &str, default: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Plays back fixed answers in order
#[cfg(test)]
pub struct ScriptedPrompter {
    answers: std::cell::RefCell<std::collections::VecDeque<String>>,
    asked: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: std::cell::RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// Prompt names asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn prompt(&self, name: &str, default: &str) -> Result<String> {
        self.asked.borrow_mut().push(name.to_string());
        let answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer for: {}", name))?;
        Ok(answer_or_default(&answer, default))
    }
}
