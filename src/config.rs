//! Node bootstrap configuration
//!
//! Built-in defaults describe a stock Ubuntu + containerd + Cilium node. A TOML
//! file may override any field, and a few environment variables override the
//! values operators most often change.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Read when no `--config` is given and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kubestrap/config.toml";

pub const ENV_K8S_VERSION: &str = "KUBESTRAP_K8S_VERSION";
pub const ENV_POD_CIDR: &str = "KUBESTRAP_POD_CIDR";
pub const ENV_SERVICE_CIDR: &str = "KUBESTRAP_SERVICE_CIDR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Kubernetes minor release used for the pkgs.k8s.io repository, e.g. `v1.31`
    pub kubernetes_version: String,
    pub containerd_config_path: String,
    pub keyring_path: String,
    pub apt_source_path: String,
    pub modules_file: String,
    pub sysctl_file: String,
    pub fstab_path: String,
    pub kernel_modules: Vec<String>,
    pub sysctl_settings: BTreeMap<String, String>,
    pub prerequisite_packages: Vec<String>,
    pub runtime_package: String,
    pub kubernetes_packages: Vec<String>,
    pub default_pod_cidr: String,
    pub default_service_cidr: String,
    pub admin_kubeconfig: String,
    pub cilium_stable_url: String,
    pub cilium_release_url: String,
    pub bin_dir: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let sysctl_settings = [
            ("net.bridge.bridge-nf-call-iptables", "1"),
            ("net.bridge.bridge-nf-call-ip6tables", "1"),
            ("net.ipv4.ip_forward", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            kubernetes_version: "v1.31".to_string(),
            containerd_config_path: "/etc/containerd/config.toml".to_string(),
            keyring_path: "/etc/apt/keyrings/kubernetes-apt-keyring.gpg".to_string(),
            apt_source_path: "/etc/apt/sources.list.d/kubernetes.list".to_string(),
            modules_file: "/etc/modules-load.d/k8s.conf".to_string(),
            sysctl_file: "/etc/sysctl.d/k8s.conf".to_string(),
            fstab_path: "/etc/fstab".to_string(),
            kernel_modules: strings(&["overlay", "br_netfilter"]),
            sysctl_settings,
            prerequisite_packages: strings(&[
                "apt-transport-https",
                "ca-certificates",
                "curl",
                "gpg",
            ]),
            runtime_package: "containerd".to_string(),
            kubernetes_packages: strings(&["kubelet", "kubeadm", "kubectl"]),
            default_pod_cidr: "10.0.0.0/16".to_string(),
            default_service_cidr: "10.96.0.0/12".to_string(),
            admin_kubeconfig: "/etc/kubernetes/admin.conf".to_string(),
            cilium_stable_url:
                "https://raw.githubusercontent.com/cilium/cilium-cli/main/stable.txt".to_string(),
            cilium_release_url: "https://github.com/cilium/cilium-cli/releases/download"
                .to_string(),
            bin_dir: "/usr/local/bin".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl NodeConfig {
    /// Load configuration: defaults, then the TOML file, then environment overrides
    ///
    /// An explicit `path` must exist; the default path is only read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `KUBESTRAP_*` overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(version) = non_empty(ENV_K8S_VERSION) {
            self.kubernetes_version = version.trim().to_string();
        }
        if let Some(cidr) = non_empty(ENV_POD_CIDR) {
            self.default_pod_cidr = cidr.trim().to_string();
        }
        if let Some(cidr) = non_empty(ENV_SERVICE_CIDR) {
            self.default_service_cidr = cidr.trim().to_string();
        }
    }

    /// Version-pinned apt repository on pkgs.k8s.io
    pub fn kubernetes_repo_url(&self) -> String {
        format!(
            "https://pkgs.k8s.io/core:/stable:/{}/deb/",
            self.kubernetes_version
        )
    }

    /// Signing key for [`Self::kubernetes_repo_url`]
    pub fn kubernetes_key_url(&self) -> String {
        format!("{}Release.key", self.kubernetes_repo_url())
    }
}
