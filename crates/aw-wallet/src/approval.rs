//! Human-approval workflow for actions a rule withheld.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use aw_audit::{AuditEvent, AuditEventKind, AuditLog};
use aw_core::{ActionKind, AgentId, RequestId};

use crate::client::ExecutionClient;
use crate::error::{WalletError, WalletResult};

/// Lifecycle of a held action. `Pending` is claimed exactly once;
/// `Executing` is the transient window while an approved request runs
/// through the client. There is no automatic expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Executing,
    Approved,
    Denied,
    Failed,
}

/// An action withheld for human adjudication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    pub request_id: RequestId,
    pub agent_id: AgentId,
    pub action: ActionKind,
    /// The original request, replayed verbatim on approval.
    pub request: Value,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Holds require-approval actions pending a human decision.
///
/// One lock guards the map; create and resolve are mutually exclusive, so
/// a request resolves exactly once.
pub struct ApprovalQueue {
    requests: Mutex<HashMap<RequestId, PendingApproval>>,
}

impl ApprovalQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// File a held action. Policy checks are NOT re-run here or on
    /// resolution; the human decision supersedes automated policy.
    pub fn create(
        &self,
        agent_id: AgentId,
        action: ActionKind,
        request: Value,
        reason: impl Into<String>,
    ) -> RequestId {
        let request_id = RequestId::new();
        let pending = PendingApproval {
            request_id,
            agent_id,
            action,
            request,
            reason: reason.into(),
            created_at: Utc::now(),
            status: ApprovalStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            result: None,
            error: None,
        };
        info!(request_id = %request_id, agent_id = %agent_id, "Action held for approval");
        self.requests.lock().insert(request_id, pending);
        request_id
    }

    #[must_use]
    pub fn get(&self, request_id: RequestId) -> Option<PendingApproval> {
        self.requests.lock().get(&request_id).cloned()
    }

    /// All requests still awaiting a decision.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingApproval> {
        self.requests
            .lock()
            .values()
            .filter(|p| p.status == ApprovalStatus::Pending)
            .cloned()
            .collect()
    }

    /// Resolve a held action.
    ///
    /// Approval executes the original request directly through the client,
    /// bypassing the rules engine and spend limits, and records the
    /// outcome in the audit trail. On execution error the request is
    /// marked `Failed` and the error surfaces to the caller. Denial marks
    /// `Denied` with the approver and time.
    ///
    /// The request is claimed (`Executing`) under the lock, but the client
    /// call itself runs outside it; a slow execution never stalls `create`,
    /// `pending`, or resolutions of other requests. A concurrent resolve of
    /// the same request sees the claim and gets `AlreadyResolved`.
    pub fn resolve(
        &self,
        request_id: RequestId,
        approved: bool,
        approver: &str,
        client: &dyn ExecutionClient,
        audit: &AuditLog,
    ) -> WalletResult<PendingApproval> {
        let (agent_id, action, request) = {
            let mut requests = self.requests.lock();
            let pending = requests
                .get_mut(&request_id)
                .ok_or_else(|| WalletError::NotFound {
                    what: "approval request",
                    id: request_id.to_string(),
                })?;

            if pending.status != ApprovalStatus::Pending {
                return Err(WalletError::AlreadyResolved {
                    request_id,
                    status: pending.status,
                });
            }

            pending.resolved_by = Some(approver.to_string());
            pending.resolved_at = Some(Utc::now());

            if !approved {
                pending.status = ApprovalStatus::Denied;
                info!(request_id = %request_id, approver, "Approval denied");
                return Ok(pending.clone());
            }

            pending.status = ApprovalStatus::Executing;
            (pending.agent_id, pending.action, pending.request.clone())
        };

        match client.execute(agent_id, action, &request) {
            Ok(result) => {
                let resolved = self.finish(
                    request_id,
                    ApprovalStatus::Approved,
                    Some(result.clone()),
                    None,
                )?;
                audit.append(
                    AuditEvent::new(agent_id, AuditEventKind::ActionExecuted, Some(action), request)
                        .with_response(result)
                        .with_metadata("approved_by", json!(approver))
                        .with_metadata("request_id", json!(request_id)),
                )?;
                info!(request_id = %request_id, approver, "Approved action executed");
                Ok(resolved)
            }
            Err(e) => {
                self.finish(request_id, ApprovalStatus::Failed, None, Some(e.to_string()))?;
                audit.append(
                    AuditEvent::new(agent_id, AuditEventKind::ActionFailed, Some(action), request)
                        .with_error(e.to_string())
                        .with_metadata("approved_by", json!(approver))
                        .with_metadata("request_id", json!(request_id)),
                )?;
                warn!(request_id = %request_id, error = %e, "Approved action failed");
                Err(WalletError::ExecutionFailed(e))
            }
        }
    }

    /// Record the outcome of an executed claim.
    fn finish(
        &self,
        request_id: RequestId,
        status: ApprovalStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> WalletResult<PendingApproval> {
        let mut requests = self.requests.lock();
        let pending = requests
            .get_mut(&request_id)
            .ok_or_else(|| WalletError::NotFound {
                what: "approval request",
                id: request_id.to_string(),
            })?;
        pending.status = status;
        pending.result = result;
        pending.error = error;
        Ok(pending.clone())
    }
}

impl Default for ApprovalQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExecutionError;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Client that either succeeds with a fixed response or always fails.
    struct StaticClient {
        fail: bool,
    }

    impl ExecutionClient for StaticClient {
        fn execute(
            &self,
            _agent_id: AgentId,
            _action: ActionKind,
            _payload: &Value,
        ) -> Result<Value, ExecutionError> {
            if self.fail {
                Err(ExecutionError::new("exchange unavailable"))
            } else {
                Ok(json!({"order_id": "ord-1"}))
            }
        }

        fn cancel_all(&self, _agent_id: AgentId) -> Result<Value, ExecutionError> {
            Ok(json!({}))
        }
    }

    fn test_log(dir: &TempDir) -> AuditLog {
        AuditLog::open(dir.path().join("audit.jsonl")).unwrap()
    }

    #[test]
    fn deny_then_second_resolution_fails() {
        let dir = TempDir::new().unwrap();
        let audit = test_log(&dir);
        let queue = ApprovalQueue::new();
        let client = StaticClient { fail: false };

        let id = queue.create(
            AgentId::new(),
            ActionKind::CreateOrder,
            json!({"ticker": "T"}),
            "Requires approval (rule: approval_threshold)",
        );
        assert_eq!(queue.pending().len(), 1);

        let resolved = queue.resolve(id, false, "ops@example.com", &client, &audit).unwrap();
        assert_eq!(resolved.status, ApprovalStatus::Denied);
        assert_eq!(resolved.resolved_by.as_deref(), Some("ops@example.com"));
        assert!(queue.pending().is_empty());

        let err = queue
            .resolve(id, true, "ops@example.com", &client, &audit)
            .unwrap_err();
        assert!(matches!(err, WalletError::AlreadyResolved { .. }));
    }

    #[test]
    fn approve_executes_directly() {
        let dir = TempDir::new().unwrap();
        let audit = test_log(&dir);
        let queue = ApprovalQueue::new();
        let client = StaticClient { fail: false };

        let id = queue.create(
            AgentId::new(),
            ActionKind::CreateOrder,
            json!({"ticker": "T"}),
            "over threshold",
        );
        let resolved = queue.resolve(id, true, "ops", &client, &audit).unwrap();
        assert_eq!(resolved.status, ApprovalStatus::Approved);
        assert_eq!(resolved.result.unwrap()["order_id"], "ord-1");
        assert_eq!(audit.len(), 1, "execution is audited");
    }

    #[test]
    fn approve_with_failing_client_marks_failed() {
        let dir = TempDir::new().unwrap();
        let audit = test_log(&dir);
        let queue = ApprovalQueue::new();
        let client = StaticClient { fail: true };

        let id = queue.create(AgentId::new(), ActionKind::CreateOrder, json!({}), "r");
        let err = queue.resolve(id, true, "ops", &client, &audit).unwrap_err();
        assert!(matches!(err, WalletError::ExecutionFailed(_)));

        let record = queue.get(id).unwrap();
        assert_eq!(record.status, ApprovalStatus::Failed);
        assert!(record.error.unwrap().contains("exchange unavailable"));
    }

    /// Client whose execute blocks until the test releases it.
    struct GatedClient {
        gate: Mutex<Receiver<()>>,
    }

    impl ExecutionClient for GatedClient {
        fn execute(
            &self,
            _agent_id: AgentId,
            _action: ActionKind,
            _payload: &Value,
        ) -> Result<Value, ExecutionError> {
            self.gate
                .lock()
                .recv_timeout(Duration::from_secs(5))
                .map_err(|_| ExecutionError::new("gate timed out"))?;
            Ok(json!({"order_id": "ord-2"}))
        }

        fn cancel_all(&self, _agent_id: AgentId) -> Result<Value, ExecutionError> {
            Ok(json!({}))
        }
    }

    #[test]
    fn queue_stays_usable_while_approved_request_executes() {
        let dir = TempDir::new().unwrap();
        let audit = Arc::new(test_log(&dir));
        let queue = Arc::new(ApprovalQueue::new());
        let (release, gate) = mpsc::channel();
        let client = Arc::new(GatedClient {
            gate: Mutex::new(gate),
        });

        let id = queue.create(AgentId::new(), ActionKind::CreateOrder, json!({}), "r");
        let worker = {
            let queue = Arc::clone(&queue);
            let client = Arc::clone(&client);
            let audit = Arc::clone(&audit);
            thread::spawn(move || queue.resolve(id, true, "ops", client.as_ref(), &audit))
        };

        // Wait for the worker to claim the request.
        for _ in 0..1000 {
            if queue.get(id).unwrap().status == ApprovalStatus::Executing {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(queue.get(id).unwrap().status, ApprovalStatus::Executing);

        // Create and list proceed while the execution is still in flight.
        let other = queue.create(AgentId::new(), ActionKind::CreateOrder, json!({}), "r2");
        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, other);

        // A concurrent resolution of the same request sees the claim.
        let bystander = StaticClient { fail: false };
        let err = queue
            .resolve(id, true, "ops2", &bystander, &audit)
            .unwrap_err();
        assert!(matches!(err, WalletError::AlreadyResolved { .. }));

        release.send(()).unwrap();
        let resolved = worker.join().unwrap().unwrap();
        assert_eq!(resolved.status, ApprovalStatus::Approved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("ops"));
    }

    #[test]
    fn unknown_request_is_not_found() {
        let dir = TempDir::new().unwrap();
        let audit = test_log(&dir);
        let queue = ApprovalQueue::new();
        let client = StaticClient { fail: false };

        let err = queue
            .resolve(RequestId::new(), true, "ops", &client, &audit)
            .unwrap_err();
        assert!(matches!(err, WalletError::NotFound { .. }));
    }
}
