//! The append-only audit log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use aw_core::AgentId;

use crate::error::AuditResult;
use crate::event::{AuditEvent, AuditEventKind};

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub agent_id: Option<AgentId>,
    pub kind: Option<AuditEventKind>,
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of events returned (most recent matches win).
    pub limit: Option<usize>,
}

impl AuditQuery {
    const DEFAULT_LIMIT: usize = 100;

    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(agent_id) = &self.agent_id {
            if event.agent_id != *agent_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if event.kind != kind {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        true
    }
}

struct LogInner {
    events: Vec<AuditEvent>,
    writer: BufWriter<File>,
}

/// Append-only, ordered record of every control-plane event.
///
/// Shared across all wallets; a single lock serializes writes and gives
/// readers a consistent snapshot. Each `append` writes one JSON line and
/// flushes before returning, so an `Ok` means the record is on disk.
pub struct AuditLog {
    path: PathBuf,
    inner: Mutex<LogInner>,
}

impl AuditLog {
    /// Open the log at `path`, creating the file in append mode.
    ///
    /// Existing records are left untouched; reopening appends after them.
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Opened audit log (append mode)");
        Ok(Self {
            path,
            inner: Mutex::new(LogInner {
                events: Vec::new(),
                writer: BufWriter::new(file),
            }),
        })
    }

    /// Path of the backing JSON Lines file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event. Write failures propagate to the caller.
    pub fn append(&self, event: AuditEvent) -> AuditResult<()> {
        let line = serde_json::to_string(&event)?;
        let mut inner = self.inner.lock();
        writeln!(inner.writer, "{line}")?;
        inner.writer.flush()?;
        debug!(
            event_id = %event.event_id,
            agent_id = %event.agent_id,
            kind = ?event.kind,
            "Audit event appended"
        );
        inner.events.push(event);
        Ok(())
    }

    /// Query events recorded by this instance, in creation order.
    ///
    /// Returns the last `limit` matches (default 100), mirroring how
    /// operators page backwards from the present.
    #[must_use]
    pub fn events(&self, query: &AuditQuery) -> Vec<AuditEvent> {
        let inner = self.inner.lock();
        let matched: Vec<AuditEvent> = inner
            .events
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        let limit = query.limit.unwrap_or(AuditQuery::DEFAULT_LIMIT);
        let skip = matched.len().saturating_sub(limit);
        matched.into_iter().skip(skip).collect()
    }

    /// Number of events recorded by this instance.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reconstruct full history by reading a log file sequentially.
pub fn replay(path: impl AsRef<Path>) -> AuditResult<Vec<AuditEvent>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}
