use crate::*;
use chrono::{DateTime, Utc};
use log::warn;
use std::sync::Arc;
use uuid::Uuid;

/// What a successfully decoded and located receipt resolves to
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifiedReceipt {
    pub hash: ReceiptHash,
    pub election_id: Uuid,
    pub election_title: String,
    pub constituency: String,
    pub cast_at: DateTime<Utc>,
}

/// Optional secondary checks against a stored vote
///
/// Empty strings count as not supplied.
#[derive(Clone, Debug, Default)]
pub struct SignatureClaims {
    pub voter_id: Option<String>,
    pub election_id: Option<Uuid>,
    pub candidate_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimField {
    VoterId,
    ElectionId,
    CandidateId,
}

impl std::fmt::Display for ClaimField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ClaimField::VoterId => "voter_id",
            ClaimField::ElectionId => "election_id",
            ClaimField::CandidateId => "candidate_id",
        };
        write!(f, "{}", name)
    }
}

/// One itemized mismatch between a claim and the stored vote
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClaimMismatch {
    pub field: ClaimField,
    pub claimed: String,
    pub stored: String,
}

/// The authoritative stored values disclosed alongside a lookup hit
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredVote {
    pub voter_id: String,
    pub election_id: Uuid,
    pub candidate_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

/// Result of a signature verification query
///
/// Verification is a query, not a command: mismatches are data, never errors.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignatureVerification {
    pub verified: bool,
    pub exists_in_database: bool,
    pub mismatches: Vec<ClaimMismatch>,
    pub stored: Option<StoredVote>,
}

impl SignatureVerification {
    fn not_found() -> Self {
        SignatureVerification {
            verified: false,
            exists_in_database: false,
            mismatches: vec![],
            stored: None,
        }
    }
}

/// The receipt verification service
///
/// Read-only against the store; never mutates the ledger.
pub struct ReceiptVerifier<S: Store> {
    store: S,
    secret: ReceiptSecret,
    audit: Arc<dyn AuditSink>,
}

impl<S: Store> ReceiptVerifier<S> {
    pub fn new(store: S, secret: ReceiptSecret) -> Self {
        ReceiptVerifier {
            store,
            secret,
            audit: Arc::new(NoopAudit),
        }
    }

    pub fn with_audit(store: S, secret: ReceiptSecret, audit: Arc<dyn AuditSink>) -> Self {
        ReceiptVerifier {
            store,
            secret,
            audit,
        }
    }

    /// Decode a transported receipt and look it up in the ledger
    ///
    /// Decode failures are client-input errors, distinct from
    /// [`Error::ReceiptNotFound`] so callers can tell "wrong format" apart
    /// from "not recorded".
    pub fn verify_encoded_receipt(
        &self,
        blob: &str,
        format: ReceiptFormat,
    ) -> Result<VerifiedReceipt, Error> {
        let record = match format {
            ReceiptFormat::Base64 => decode_receipt_from_base64(blob)?,
            ReceiptFormat::Url => serde_json::from_value(decode_from_url(blob)?)?,
        };

        let vote = self
            .store
            .vote_by_hash(&record.hash)
            .ok_or(Error::ReceiptNotFound)?;
        let election = self
            .store
            .election(vote.election_id)
            .ok_or(Error::ReceiptNotFound)?;

        self.record_audit(AuditEntry::new(
            "-",
            AuditAction::ReceiptVerified,
            &format!("receipt resolved against election {}", election.id),
        ));

        Ok(VerifiedReceipt {
            hash: vote.receipt_hash,
            election_id: election.id,
            election_title: election.title,
            constituency: election.constituency,
            cast_at: vote.cast_at,
        })
    }

    /// Check a receipt hash, and optionally claimed fields, against the
    /// recorded vote
    ///
    /// Finding the hash with no claims supplied is sufficient for
    /// `verified = true`. Any mismatching claim flips `verified` to false
    /// while still disclosing the authoritative stored values.
    pub fn verify_digital_signature(
        &self,
        hash: &ReceiptHash,
        claims: &SignatureClaims,
    ) -> SignatureVerification {
        let vote = match self.store.vote_by_hash(hash) {
            Some(vote) => vote,
            None => return SignatureVerification::not_found(),
        };

        let mut mismatches = vec![];

        if let Some(claimed) = claims.voter_id.as_deref() {
            if !claimed.is_empty() && claimed != vote.voter_id {
                mismatches.push(ClaimMismatch {
                    field: ClaimField::VoterId,
                    claimed: claimed.to_owned(),
                    stored: vote.voter_id.clone(),
                });
            }
        }
        if let Some(claimed) = claims.election_id {
            if claimed != vote.election_id {
                mismatches.push(ClaimMismatch {
                    field: ClaimField::ElectionId,
                    claimed: claimed.to_string(),
                    stored: vote.election_id.to_string(),
                });
            }
        }
        if let Some(claimed) = claims.candidate_id {
            if claimed != vote.candidate_id {
                mismatches.push(ClaimMismatch {
                    field: ClaimField::CandidateId,
                    claimed: claimed.to_string(),
                    stored: vote.candidate_id.to_string(),
                });
            }
        }

        self.record_audit(AuditEntry::new(
            "-",
            AuditAction::SignatureChecked,
            &format!("hash {} checked with {} mismatch(es)", hash, mismatches.len()),
        ));

        SignatureVerification {
            verified: mismatches.is_empty(),
            exists_in_database: true,
            stored: Some(StoredVote {
                voter_id: vote.voter_id,
                election_id: vote.election_id,
                candidate_id: vote.candidate_id,
                cast_at: vote.cast_at,
            }),
            mismatches,
        }
    }

    /// Open the sealed details of a vote for an integrity cross-check
    pub fn unseal(&self, vote: &Vote) -> Result<VoteDetails, Error> {
        open_details(&self.secret, &vote.sealed_details)
    }

    fn record_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(entry) {
            warn!("voteledger: audit append failed: {}", e);
        }
    }
}
