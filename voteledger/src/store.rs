use crate::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// The ledger storage boundary
///
/// Reads run with snapshot semantics against committed state; `commit_vote`
/// is the single mutating operation and the sole serialization point.
pub trait Store: Send + Sync {
    /// Get an election by ID
    fn election(&self, election_id: Uuid) -> Option<Election>;

    /// Get a committed vote by its receipt hash
    fn vote_by_hash(&self, hash: &ReceiptHash) -> Option<Vote>;

    /// Get a committed vote by its (voter, election) pair
    fn vote_by_voter(&self, voter_id: &str, election_id: Uuid) -> Option<Vote>;

    /// Commit a vote as one atomic unit: uniqueness check on
    /// (voter, election), ledger append, candidate count increment, vote
    /// insert. Either everything commits or nothing does.
    fn commit_vote(&self, vote: Vote) -> Result<(), Error>;

    /// Get a ledger block by chain position
    fn block(&self, index: u64) -> Option<Block>;

    fn chain_stats(&self) -> ChainStats;
}

impl<S: Store> Store for Arc<S> {
    fn election(&self, election_id: Uuid) -> Option<Election> {
        (**self).election(election_id)
    }

    fn vote_by_hash(&self, hash: &ReceiptHash) -> Option<Vote> {
        (**self).vote_by_hash(hash)
    }

    fn vote_by_voter(&self, voter_id: &str, election_id: Uuid) -> Option<Vote> {
        (**self).vote_by_voter(voter_id, election_id)
    }

    fn commit_vote(&self, vote: Vote) -> Result<(), Error> {
        (**self).commit_vote(vote)
    }

    fn block(&self, index: u64) -> Option<Block> {
        (**self).block(index)
    }

    fn chain_stats(&self) -> ChainStats {
        (**self).chain_stats()
    }
}

struct Inner {
    elections: HashMap<Uuid, Election>,
    votes_by_hash: BTreeMap<String, Vote>,
    voter_index: HashMap<(String, Uuid), ReceiptHash>,
    ledger: Ledger,
}

/// A thread-safe store that keeps everything in memory
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new(policy: LedgerPolicy) -> Self {
        MemStore {
            inner: RwLock::new(Inner {
                elections: HashMap::new(),
                votes_by_hash: BTreeMap::new(),
                voter_index: HashMap::new(),
                ledger: Ledger::new(policy),
            }),
        }
    }

    /// Insert or replace an election. This is the admin boundary; votes are
    /// only ever written through [`Store::commit_vote`].
    pub fn set_election(&self, election: Election) {
        self.write().elections.insert(election.id, election);
    }

    fn read(&self) -> RwLockReadGuard<Inner> {
        self.inner.read().expect("voteledger: store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<Inner> {
        self.inner.write().expect("voteledger: store lock poisoned")
    }
}

impl Default for MemStore {
    fn default() -> Self {
        MemStore::new(LedgerPolicy::default())
    }
}

impl Store for MemStore {
    fn election(&self, election_id: Uuid) -> Option<Election> {
        self.read().elections.get(&election_id).cloned()
    }

    fn vote_by_hash(&self, hash: &ReceiptHash) -> Option<Vote> {
        self.read().votes_by_hash.get(&hash.to_string()).cloned()
    }

    fn vote_by_voter(&self, voter_id: &str, election_id: Uuid) -> Option<Vote> {
        let inner = self.read();
        let hash = inner
            .voter_index
            .get(&(voter_id.to_owned(), election_id))?;
        inner.votes_by_hash.get(&hash.to_string()).cloned()
    }

    fn commit_vote(&self, vote: Vote) -> Result<(), Error> {
        let mut inner = self.write();

        // All fallible checks run before the first mutation, so an abort
        // leaves the store exactly as it was.
        let voter_key = (vote.voter_id.clone(), vote.election_id);
        if inner.voter_index.contains_key(&voter_key) {
            return Err(Error::DoubleVoteAttempt);
        }

        let hash_key = vote.receipt_hash.to_string();
        if inner.votes_by_hash.contains_key(&hash_key) {
            return Err(Error::LedgerAppendFailure(
                "duplicate receipt hash".to_owned(),
            ));
        }

        let candidate_exists = inner
            .elections
            .get(&vote.election_id)
            .map(|e| e.candidates.contains_key(&vote.candidate_id));
        match candidate_exists {
            None => return Err(Error::ElectionNotActive),
            Some(false) => return Err(Error::CandidateNotFound),
            Some(true) => {}
        }

        inner.ledger.append_transaction(vote.receipt_hash)?;

        if let Some(candidate) = inner
            .elections
            .get_mut(&vote.election_id)
            .and_then(|e| e.candidates.get_mut(&vote.candidate_id))
        {
            candidate.vote_count += 1;
        }
        inner.voter_index.insert(voter_key, vote.receipt_hash);
        inner.votes_by_hash.insert(hash_key, vote);

        Ok(())
    }

    fn block(&self, index: u64) -> Option<Block> {
        self.read().ledger.block(index).cloned()
    }

    fn chain_stats(&self) -> ChainStats {
        self.read().ledger.chain_stats()
    }
}
