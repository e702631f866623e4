use crate::*;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A recorded vote
///
/// Created exactly once by the vote caster and immutable thereafter. At most
/// one vote may ever exist for a given (voter, election) pair.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vote {
    pub id: Uuid,
    pub voter_id: String,
    pub election_id: Uuid,
    pub candidate_id: Uuid,
    pub receipt_hash: ReceiptHash,
    pub cast_at: DateTime<Utc>,
    pub sealed_details: SealedDetails,
}

impl Vote {
    pub fn new(
        voter_id: &str,
        election_id: Uuid,
        candidate_id: Uuid,
        receipt_hash: ReceiptHash,
        cast_at: DateTime<Utc>,
        sealed_details: SealedDetails,
    ) -> Self {
        Vote {
            id: Uuid::new_v4(),
            voter_id: voter_id.to_owned(),
            election_id,
            candidate_id,
            receipt_hash,
            cast_at,
            sealed_details,
        }
    }
}
