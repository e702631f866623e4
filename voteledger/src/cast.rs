use crate::*;
use chrono::Utc;
use log::warn;
use std::sync::Arc;
use uuid::Uuid;

/// The vote transaction manager
///
/// Exclusively owns vote creation. One cast is one atomic unit: the vote
/// insert, the candidate count increment and the ledger append all commit
/// together or not at all.
pub struct VoteCaster<S: Store> {
    store: S,
    secret: ReceiptSecret,
    audit: Arc<dyn AuditSink>,
}

impl<S: Store> VoteCaster<S> {
    pub fn new(store: S, secret: ReceiptSecret) -> Self {
        VoteCaster {
            store,
            secret,
            audit: Arc::new(NoopAudit),
        }
    }

    pub fn with_audit(store: S, secret: ReceiptSecret, audit: Arc<dyn AuditSink>) -> Self {
        VoteCaster {
            store,
            secret,
            audit,
        }
    }

    /// Cast a vote and return the receipt bundle
    ///
    /// The election's effective status must be LIVE at the time of the call.
    /// A voter who already has a vote recorded for this election gets
    /// [`Error::DoubleVoteAttempt`] and no side effects.
    pub fn cast_vote(
        &self,
        voter_id: &str,
        election_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<ReceiptBundle, Error> {
        let now = Utc::now();

        let election = self
            .store
            .election(election_id)
            .ok_or(Error::ElectionNotActive)?;
        if !election.is_open_at(now) {
            return Err(Error::ElectionNotActive);
        }
        if election.get_candidate(candidate_id).is_none() {
            return Err(Error::CandidateNotFound);
        }

        let receipt_hash = derive_receipt_hash(voter_id, &election_id, &candidate_id);
        let details = VoteDetails {
            candidate_id,
            cast_at: now,
            session_id: Uuid::new_v4(),
        };
        let sealed = seal_details(&self.secret, &details);

        let vote = Vote::new(voter_id, election_id, candidate_id, receipt_hash, now, sealed);
        self.store.commit_vote(vote.clone())?;

        let bundle = ReceiptBundle::for_vote(&vote)?;

        let entry = AuditEntry::new(
            voter_id,
            AuditAction::VoteCast,
            &format!("vote recorded in election {}", election_id),
        );
        if let Err(e) = self.audit.record(entry) {
            warn!("voteledger: audit append failed: {}", e);
        }

        Ok(bundle)
    }
}
