//! Terminal error kinds for the bootstrap workflow

use thiserror::Error;

/// Failures that end the run with a specific exit code.
///
/// Everything else surfaces as a plain `anyhow` error and exits with 1.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("this installer must be run as root (try: sudo kubestrap)")]
    NotRoot,

    #[error("invalid {field}: '{value}'")]
    InvalidInput { field: &'static str, value: String },

    #[error("invalid role selection '{0}' (expected 1 or 2)")]
    UnknownRole(String),

    #[error("join command must start with 'kubeadm join', got: '{0}'")]
    InvalidJoinCommand(String),

    #[error("command '{command}' failed with exit code {}", describe_code(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("archive {archive} does not contain '{entry}'")]
    MissingArchiveEntry { archive: String, entry: String },
}

fn describe_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl BootstrapError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::CommandFailed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Exit code for an arbitrary error chain
///
/// Uses the first `BootstrapError` found in the chain, or 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BootstrapError>())
        .map(BootstrapError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_command_failure_keeps_exit_code() {
        let err = BootstrapError::CommandFailed {
            command: "apt-get update".to_string(),
            code: Some(100),
        };
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn test_signal_killed_command_exits_with_one() {
        let err = BootstrapError::CommandFailed {
            command: "kubeadm init".to_string(),
            code: None,
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_exit_code_found_through_context() {
        let result: anyhow::Result<()> = Err(BootstrapError::CommandFailed {
            command: "modprobe overlay".to_string(),
            code: Some(3),
        }
        .into());
        let err = result.context("Step 'Load kernel modules' failed").unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
    }

    #[test]
    fn test_plain_errors_exit_with_one() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);

        let err = anyhow::Error::from(BootstrapError::UnknownRole("3".to_string()));
        assert_eq!(exit_code_for(&err), 1);
    }
}
