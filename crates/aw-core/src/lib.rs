//! Core domain types for the agent wallet control plane.
//!
//! This crate provides the fundamental types shared by every component of
//! the policy enforcement pipeline:
//! - `AgentId`, `EventId`, `RequestId`: opaque identifiers
//! - `Agent`: a controlled autonomous caller
//! - `ActionKind`, `OrderRequest`: the actions subject to policy
//! - `SpendLimit`: fixed per-agent ceilings
//! - `Verdict`, `BlockReason`: policy outcomes

pub mod action;
pub mod agent;
pub mod error;
pub mod id;
pub mod limit;
pub mod verdict;

pub use action::{ActionKind, OrderRequest, OrderSide, TradeAction};
pub use agent::Agent;
pub use error::{CoreError, CoreResult};
pub use id::{AgentId, EventId, RequestId};
pub use limit::SpendLimit;
pub use verdict::{BlockReason, Verdict};
