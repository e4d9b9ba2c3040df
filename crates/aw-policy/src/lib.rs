//! Policy evaluation for the agent wallet.
//!
//! Three collaborating pieces:
//! - `check_spend_limit`: fixed per-agent ceilings, evaluated first
//! - `RulesEngine`: ordered, prioritized rules with serializable conditions
//! - `SpendTracker`: per-agent spend history answering windowed sums

pub mod condition;
pub mod context;
pub mod engine;
pub mod error;
pub mod limits;
pub mod spend;

pub use condition::Condition;
pub use context::{OrderFacts, RuleContext};
pub use engine::{Rule, RulesEngine};
pub use error::{PolicyError, PolicyResult};
pub use limits::check_spend_limit;
pub use spend::{SpendRecord, SpendTracker};
