//! Wallet manager configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use aw_core::SpendLimit;

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("agent_wallet_audit.jsonl")
}

fn default_install_default_rules() -> bool {
    true
}

/// Configuration for the composition root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// JSON Lines file backing the audit log.
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,
    /// Install the built-in safety rules (deny very large orders, require
    /// approval over the threshold) at startup.
    #[serde(default = "default_install_default_rules")]
    pub install_default_rules: bool,
    /// Spend limit attached to agents registered without an explicit one.
    #[serde(default)]
    pub default_spend_limit: SpendLimit,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            audit_log_path: default_audit_log_path(),
            install_default_rules: default_install_default_rules(),
            default_spend_limit: SpendLimit::default(),
        }
    }
}
