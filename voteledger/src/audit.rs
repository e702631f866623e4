use crate::*;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Actions worth an audit trail entry
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    VoteCast,
    ReceiptVerified,
    SignatureChecked,
    CreatedElection,
    ViewedDashboard,
}

/// One append-only audit trail entry, never mutated
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuditEntry {
    pub actor_id: String,
    pub action: AuditAction,
    pub detail: String,
    pub origin: String,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor_id: &str, action: AuditAction, detail: &str) -> Self {
        AuditEntry {
            actor_id: actor_id.to_owned(),
            action,
            detail: detail.to_owned(),
            origin: "-".to_owned(),
            at: Utc::now(),
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_owned();
        self
    }
}

/// Where audit entries go
///
/// Appends are fire-and-forget from the engine's perspective: a sink failure
/// is logged and swallowed, never allowed to roll back a vote.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), Error>;
}

/// Sink that drops every entry
pub struct NoopAudit;

impl AuditSink for NoopAudit {
    fn record(&self, _entry: AuditEntry) -> Result<(), Error> {
        Ok(())
    }
}

/// In-memory append-only audit log
#[derive(Default)]
pub struct MemAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemAuditLog {
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("voteledger: audit lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the entries recorded so far
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .expect("voteledger: audit lock poisoned")
            .clone()
    }
}

impl AuditSink for MemAuditLog {
    fn record(&self, entry: AuditEntry) -> Result<(), Error> {
        self.entries
            .lock()
            .expect("voteledger: audit lock poisoned")
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_mem_audit_log() {
        let log = MemAuditLog::default();
        assert!(log.is_empty());

        log.record(AuditEntry::new("admin-1", AuditAction::CreatedElection, "General Election"))
            .unwrap();
        log.record(
            AuditEntry::new("voter-1", AuditAction::VoteCast, "North Ward")
                .with_origin("203.0.113.9"),
        )
        .unwrap();

        assert_eq!(log.len(), 2);
        let entries = log.entries();
        assert_eq!(entries[0].action, AuditAction::CreatedElection);
        assert_eq!(entries[1].origin, "203.0.113.9");
    }
}
