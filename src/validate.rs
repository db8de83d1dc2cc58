//! Operator input validation
//!
//! The IP and CIDR checks are syntactic only: octets above 255 and prefix
//! lengths above 32 are accepted and left for kubeadm to reject.

use crate::error::BootstrapError;
use regex::Regex;
use std::sync::LazyLock;

/// Prefix every accepted join command starts with
pub const JOIN_PREFIX: &str = "kubeadm join";

static IPV4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("valid IPv4 pattern"));

static CIDR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}/\d+$").expect("valid CIDR pattern"));

pub fn is_ipv4(value: &str) -> bool {
    IPV4_RE.is_match(value)
}

pub fn is_cidr(value: &str) -> bool {
    CIDR_RE.is_match(value)
}

/// Validate a dotted-quad address, returning it unchanged
pub fn ipv4(field: &'static str, value: &str) -> Result<String, BootstrapError> {
    if is_ipv4(value) {
        Ok(value.to_string())
    } else {
        Err(BootstrapError::InvalidInput {
            field,
            value: value.to_string(),
        })
    }
}

/// Validate a dotted-quad with prefix length, returning it unchanged
pub fn cidr(field: &'static str, value: &str) -> Result<String, BootstrapError> {
    if is_cidr(value) {
        Ok(value.to_string())
    } else {
        Err(BootstrapError::InvalidInput {
            field,
            value: value.to_string(),
        })
    }
}

/// Accept a pasted join command if it starts with `kubeadm join`
///
/// Only the leading words are checked; the rest is passed through untouched.
pub fn join_command(value: &str) -> Result<String, BootstrapError> {
    let trimmed = value.trim();
    let mut words = trimmed.split_whitespace();
    if words.next() == Some("kubeadm") && words.next() == Some("join") {
        Ok(trimmed.to_string())
    } else {
        Err(BootstrapError::InvalidJoinCommand(trimmed.to_string()))
    }
}
