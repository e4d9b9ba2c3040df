//! Policy enforcement pipeline for agent financial actions.
//!
//! Every action an agent requests passes through one path:
//! request → kill-switch check → agent-active check → spend-limit check →
//! rules evaluation → verdict → (execute | hold-for-approval | reject),
//! with an audit event emitted at each transition.
//!
//! Components:
//! - `Wallet`: the per-agent pipeline orchestrator
//! - `KillSwitch`: latched emergency stop (per-agent and global)
//! - `ApprovalQueue`: actions held for a human decision
//! - `WalletManager`: registry and composition root
//! - `ExecutionClient`: the opaque external execution capability

pub mod approval;
pub mod client;
pub mod config;
pub mod error;
pub mod kill_switch;
pub mod logging;
pub mod manager;
pub mod wallet;

pub use approval::{ApprovalQueue, ApprovalStatus, PendingApproval};
pub use client::{ExecutionClient, ExecutionError};
pub use config::WalletConfig;
pub use error::{WalletError, WalletResult};
pub use kill_switch::KillSwitch;
pub use logging::init_logging;
pub use manager::{ActionOutcome, WalletManager};
pub use wallet::{KillSwitchReport, Wallet};
