//! In-memory host used by unit tests

use crate::error::BootstrapError;
use crate::utils::exec::{HostEnvironment, command_line};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Records every command and keeps files in memory
pub struct FakeHost {
    root: bool,
    user: String,
    env: HashMap<String, String>,
    outputs: HashMap<String, String>,
    failures: Vec<(String, i32)>,
    urls: HashMap<String, Vec<u8>>,
    missing_commands: HashSet<String>,
    commands: RefCell<Vec<String>>,
    shell_commands: RefCell<Vec<String>>,
    piped: RefCell<Vec<(String, Vec<u8>)>>,
    fetched: RefCell<Vec<String>>,
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    modes: RefCell<BTreeMap<String, u32>>,
    dirs: RefCell<Vec<String>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            root: true,
            user: "root".to_string(),
            env: HashMap::new(),
            outputs: HashMap::new(),
            failures: Vec::new(),
            urls: HashMap::new(),
            missing_commands: HashSet::new(),
            commands: RefCell::new(Vec::new()),
            shell_commands: RefCell::new(Vec::new()),
            piped: RefCell::new(Vec::new()),
            fetched: RefCell::new(Vec::new()),
            files: RefCell::new(BTreeMap::new()),
            modes: RefCell::new(BTreeMap::new()),
            dirs: RefCell::new(Vec::new()),
        }
    }

    /// Scripted stdout for an exact command line
    pub fn with_output(mut self, command: &str, stdout: &str) -> Self {
        self.outputs.insert(command.to_string(), stdout.to_string());
        self
    }

    /// Commands starting with `prefix` exit with `code`
    pub fn with_failure(mut self, prefix: &str, code: i32) -> Self {
        self.failures.push((prefix.to_string(), code));
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn with_url(mut self, url: &str, body: &[u8]) -> Self {
        self.urls.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn not_root(mut self) -> Self {
        self.root = false;
        self
    }

    pub fn without_command(mut self, command: &str) -> Self {
        self.missing_commands.insert(command.to_string());
        self
    }

    /// Every command line executed, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    /// Raw command strings passed to `run_shell`
    pub fn shell_commands(&self) -> Vec<String> {
        self.shell_commands.borrow().clone()
    }

    pub fn piped(&self) -> Vec<(String, Vec<u8>)> {
        self.piped.borrow().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
    }

    pub fn file_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn mode(&self, path: &str) -> Option<u32> {
        self.modes.borrow().get(path).copied()
    }

    pub fn dirs(&self) -> Vec<String> {
        self.dirs.borrow().clone()
    }

    /// Whether any executed command line starts with `prefix`
    pub fn ran(&self, prefix: &str) -> bool {
        self.position(prefix).is_some()
    }

    /// Index of the first executed command line starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands
            .borrow()
            .iter()
            .position(|line| line.starts_with(prefix))
    }

    fn record(&self, line: String) -> Result<()> {
        self.commands.borrow_mut().push(line.clone());
        match self
            .failures
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
        {
            Some((_, code)) => Err(BootstrapError::CommandFailed {
                command: line,
                code: Some(*code),
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl HostEnvironment for FakeHost {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        self.record(command_line(program, args))
    }

    fn capture(&self, program: &str, args: &[&str]) -> Result<String> {
        let line = command_line(program, args);
        self.record(line.clone())?;
        Ok(self
            .outputs
            .get(&line)
            .map(|out| out.trim().to_string())
            .unwrap_or_default())
    }

    fn pipe(&self, program: &str, args: &[&str], input: &[u8]) -> Result<()> {
        let line = command_line(program, args);
        self.piped.borrow_mut().push((line.clone(), input.to_vec()));
        self.record(line)
    }

    fn run_shell(&self, command: &str) -> Result<()> {
        self.shell_commands.borrow_mut().push(command.to_string());
        self.record(format!("sh -c {}", command))
    }

    fn read_file(&self, path: &str) -> Result<String> {
        self.file(path)
            .ok_or_else(|| anyhow::anyhow!("Failed to read file: {}", path))
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn set_mode(&self, path: &str, mode: u32) -> Result<()> {
        self.modes.borrow_mut().insert(path.to_string(), mode);
        Ok(())
    }

    fn mkdir_p(&self, path: &str) -> Result<()> {
        self.dirs.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn command_exists(&self, command: &str) -> bool {
        !self.missing_commands.contains(command)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetched.borrow_mut().push(url.to_string());
        self.urls
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("HTTP error downloading {}: 404 Not Found", url))
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn username(&self) -> String {
        self.user.clone()
    }
}
