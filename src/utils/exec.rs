use crate::error::BootstrapError;
use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

/// Everything the bootstrap steps are allowed to do to the machine
///
/// Steps never touch the process table, filesystem or network directly; they go
/// through this trait so a run can be swapped for a dry run or an in-memory fake.
pub trait HostEnvironment {
    /// Run a program with inherited stdio, failing on non-zero exit
    fn run(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Run a program and return its trimmed stdout, failing on non-zero exit
    fn capture(&self, program: &str, args: &[&str]) -> Result<String>;

    /// Run a program with `input` piped to its stdin
    fn pipe(&self, program: &str, args: &[&str], input: &[u8]) -> Result<()>;

    /// Run a command line through `sh -c` with inherited stdio
    fn run_shell(&self, command: &str) -> Result<()>;

    /// Read a file
    fn read_file(&self, path: &str) -> Result<String>;

    /// Write a file, replacing any existing content
    fn write_file(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Set unix permission bits on a file
    fn set_mode(&self, path: &str, mode: u32) -> Result<()>;

    /// Create directory recursively
    fn mkdir_p(&self, path: &str) -> Result<()>;

    /// Check if file exists
    fn file_exists(&self, path: &str) -> bool;

    /// Check if a command is on the PATH
    fn command_exists(&self, command: &str) -> bool;

    /// Download a URL over HTTPS
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Whether the effective user is root
    fn is_root(&self) -> bool;

    /// Read an environment variable of the running process
    fn env_var(&self, name: &str) -> Option<String>;

    /// Name of the effective user
    fn username(&self) -> String;
}

/// Render a program and its arguments as a single command line for messages
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn ensure_success(command: String, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(BootstrapError::CommandFailed {
        command,
        code: status.code(),
    }
    .into())
}

/// The machine this process runs on
pub struct LocalHost {
    client: reqwest::blocking::Client,
}

impl LocalHost {
    pub fn new() -> Result<Self> {
        // Large release archives must not hit a whole-request deadline
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .user_agent(concat!("kubestrap/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl HostEnvironment for LocalHost {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let line = command_line(program, args);
        tracing::debug!(command = %line, "running");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute command: {}", program))?;
        ensure_success(line, status)
    }

    fn capture(&self, program: &str, args: &[&str]) -> Result<String> {
        let line = command_line(program, args);
        tracing::debug!(command = %line, "capturing");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("Failed to execute command: {}", program))?;
        ensure_success(line, output.status)?;
        Ok(super::string::bytes_to_string(&output.stdout))
    }

    fn pipe(&self, program: &str, args: &[&str], input: &[u8]) -> Result<()> {
        let line = command_line(program, args);
        tracing::debug!(command = %line, bytes = input.len(), "piping");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to execute command: {}", program))?;

        // A child that exits early closes its stdin; its exit status wins
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(input).and_then(|_| stdin.flush()),
            None => Ok(()),
        };

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for command: {}", program))?;
        ensure_success(line, status)?;
        written.with_context(|| format!("Failed to write stdin of command: {}", program))
    }

    fn run_shell(&self, command: &str) -> Result<()> {
        tracing::debug!(command, "running shell");
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute shell command: {}", command))?;
        ensure_success(command.to_string(), status)
    }

    fn read_file(&self, path: &str) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        tracing::debug!(path, bytes = content.len(), "writing file");
        std::fs::write(path, content).with_context(|| format!("Failed to write file: {}", path))
    }

    fn set_mode(&self, path: &str, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("Failed to set permissions for: {}", path))
    }

    fn mkdir_p(&self, path: &str) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path))
    }

    fn file_exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }

    fn command_exists(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "fetching");
        let bytes = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error downloading {}", url))?
            .bytes()
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(bytes.to_vec())
    }

    fn is_root(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail
        unsafe { libc::geteuid() == 0 }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn username(&self) -> String {
        whoami::username()
    }
}

/// Programs a dry run may still execute because they only read host state
fn is_read_only(program: &str) -> bool {
    matches!(program, "ip" | "uname" | "hostname" | "getent")
}

/// Single-quote `value` for display as one shell word
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Reports every mutation instead of performing it
///
/// Reads, environment lookups and downloads go to the real machine so the
/// printed plan reflects what a real run would do.
pub struct DryRunHost {
    inner: LocalHost,
}

impl DryRunHost {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: LocalHost::new()?,
        })
    }

    fn report(&self, action: &str) {
        println!("  [dry-run] {}", action);
    }
}

impl HostEnvironment for DryRunHost {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        self.report(&command_line(program, args));
        Ok(())
    }

    fn capture(&self, program: &str, args: &[&str]) -> Result<String> {
        // Lookups without side effects still run so defaults can be computed
        if is_read_only(program) {
            return self.inner.capture(program, args);
        }
        self.report(&command_line(program, args));
        Ok(String::new())
    }

    fn pipe(&self, program: &str, args: &[&str], input: &[u8]) -> Result<()> {
        self.report(&format!(
            "{} < ({} bytes)",
            command_line(program, args),
            input.len()
        ));
        Ok(())
    }

    fn run_shell(&self, command: &str) -> Result<()> {
        self.report(&format!("sh -c {}", shell_quote(command)));
        Ok(())
    }

    fn read_file(&self, path: &str) -> Result<String> {
        if self.inner.file_exists(path) {
            self.inner.read_file(path)
        } else {
            Ok(String::new())
        }
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        self.report(&format!("write {} ({} bytes)", path, content.len()));
        Ok(())
    }

    fn set_mode(&self, path: &str, mode: u32) -> Result<()> {
        self.report(&format!("chmod {:o} {}", mode, path));
        Ok(())
    }

    fn mkdir_p(&self, path: &str) -> Result<()> {
        self.report(&format!("mkdir -p {}", path));
        Ok(())
    }

    fn file_exists(&self, path: &str) -> bool {
        self.inner.file_exists(path)
    }

    fn command_exists(&self, command: &str) -> bool {
        self.inner.command_exists(command)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.inner.fetch(url)
    }

    fn is_root(&self) -> bool {
        if !self.inner.is_root() {
            eprintln!("⚠ Not running as root; a real run would stop here.");
        }
        true
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.inner.env_var(name)
    }

    fn username(&self) -> String {
        self.inner.username()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_rendering() {
        assert_eq!(command_line("swapoff", &["-a"]), "swapoff -a");
        assert_eq!(command_line("true", &[]), "true");
    }

    #[test]
    fn test_local_run_reports_exit_code() {
        let host = LocalHost::new().unwrap();
        let err = host.run("sh", &["-c", "exit 7"]).unwrap_err();
        let failure = err.downcast_ref::<BootstrapError>().unwrap();
        assert_eq!(failure.exit_code(), 7);
    }

    #[test]
    fn test_local_capture_trims_output() {
        let host = LocalHost::new().unwrap();
        let out = host.capture("sh", &["-c", "echo '  hello  '"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_local_pipe_feeds_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("piped.txt");
        let target = target.to_str().unwrap();
        let host = LocalHost::new().unwrap();
        host.pipe("sh", &["-c", &format!("cat > {}", target)], b"piped")
            .unwrap();
        assert_eq!(host.read_file(target).unwrap(), "piped");
    }

    #[test]
    fn test_local_pipe_keeps_exit_code_when_child_exits_early() {
        let host = LocalHost::new().unwrap();
        let input = vec![b'x'; 4 * 1024 * 1024];
        let err = host.pipe("sh", &["-c", "exit 5"], &input).unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 5);
    }

    #[test]
    fn test_dry_run_still_runs_lookups() {
        assert!(is_read_only("getent"));
        assert!(is_read_only("uname"));
        assert!(!is_read_only("kubeadm"));
        assert!(!is_read_only("chown"));

        let host = DryRunHost::new().unwrap();
        let entry = host.capture("getent", &["passwd", "root"]).unwrap();
        assert!(entry.starts_with("root:"));
        assert_eq!(host.capture("kubeadm", &["token", "create"]).unwrap(), "");
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("kubeadm join a:6443"), "'kubeadm join a:6443'");
        assert_eq!(shell_quote("echo 'hi'"), r"'echo '\''hi'\'''");
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("never.txt");
        let target = target.to_str().unwrap();
        let host = DryRunHost::new().unwrap();
        host.write_file(target, b"data").unwrap();
        host.run("false", &[]).unwrap();
        assert!(!host.file_exists(target));
        assert_eq!(host.read_file(target).unwrap(), "");
    }

    #[test]
    fn test_which_finds_shell() {
        let host = LocalHost::new().unwrap();
        assert!(host.command_exists("sh"));
        assert!(!host.command_exists("definitely-not-a-real-binary-kubestrap"));
    }
}
