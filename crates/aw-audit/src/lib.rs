//! Append-only audit log for the agent wallet.
//!
//! Every event is one self-contained JSON line, written in creation order.
//! JSON Lines keeps the record robust: partial corruption only affects
//! individual lines, and the full history can be reconstructed by reading
//! the file sequentially.

pub mod error;
pub mod event;
pub mod log;

pub use error::{AuditError, AuditResult};
pub use event::{AuditEvent, AuditEventKind};
pub use log::{replay, AuditLog, AuditQuery};
