use crate::*;
use chrono::{DateTime, Utc};

pub const DEFAULT_BLOCK_CAPACITY: usize = 10;

/// Inert proof-of-work-style parameter, reported but never used to gate
/// appends. Kept for compatibility with chain-stats consumers.
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Block sealing policy
#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct LedgerPolicy {
    /// A block seals once it holds this many transactions
    pub block_capacity: usize,
    pub difficulty: u32,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        LedgerPolicy {
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    Open,
    Sealed,
}

/// One block of the append-only chain
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Block {
    pub index: u64,
    pub created_at: DateTime<Utc>,
    pub transactions: Vec<ReceiptHash>,
    pub state: BlockState,
}

impl Block {
    fn genesis() -> Self {
        Block {
            index: 0,
            created_at: Utc::now(),
            transactions: vec![ReceiptHash::genesis()],
            state: BlockState::Sealed,
        }
    }

    fn open(index: u64) -> Self {
        Block {
            index,
            created_at: Utc::now(),
            transactions: vec![],
            state: BlockState::Open,
        }
    }
}

/// Chain statistics reported to auditors
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChainStats {
    /// Number of sealed blocks; 1 at genesis, monotonically non-decreasing
    pub chain_length: u64,
    pub total_transactions: u64,
    pub difficulty: u32,
}

/// Append-only single-writer block chain
///
/// Not a distributed-consensus structure: a sequence arena with monotonically
/// increasing indices. Blocks are immutable once sealed.
#[derive(Clone, Debug)]
pub struct Ledger {
    blocks: Vec<Block>,
    policy: LedgerPolicy,
}

impl Ledger {
    pub fn new(policy: LedgerPolicy) -> Self {
        Ledger {
            blocks: vec![Block::genesis()],
            policy,
        }
    }

    /// Append a transaction hash to the current open block, opening a fresh
    /// block first if the chain has none
    pub fn append_transaction(&mut self, hash: ReceiptHash) -> Result<(), Error> {
        if self.blocks.last().map(|b| b.state) != Some(BlockState::Open) {
            let next_index = self.blocks.len() as u64;
            self.blocks.push(Block::open(next_index));
        }

        let capacity = self.policy.block_capacity;
        let block = self
            .blocks
            .last_mut()
            .ok_or_else(|| Error::LedgerAppendFailure("chain is empty".to_owned()))?;

        if block.transactions.contains(&hash) {
            return Err(Error::LedgerAppendFailure(
                "duplicate transaction hash".to_owned(),
            ));
        }

        block.transactions.push(hash);
        if block.transactions.len() >= capacity {
            block.state = BlockState::Sealed;
        }

        Ok(())
    }

    /// Get the block at the given chain position
    pub fn block(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn chain_stats(&self) -> ChainStats {
        let chain_length = self
            .blocks
            .iter()
            .filter(|b| b.state == BlockState::Sealed)
            .count() as u64;
        let total_transactions = self
            .blocks
            .iter()
            .map(|b| b.transactions.len() as u64)
            .sum();

        ChainStats {
            chain_length,
            total_transactions,
            difficulty: self.policy.difficulty,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new(LedgerPolicy::default())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use uuid::Uuid;

    fn some_hash(tag: &str) -> ReceiptHash {
        derive_receipt_hash(tag, &Uuid::new_v4(), &Uuid::new_v4())
    }

    #[test]
    fn test_genesis_chain() {
        let ledger = Ledger::default();

        let stats = ledger.chain_stats();
        assert_eq!(stats.chain_length, 1);
        assert_eq!(stats.total_transactions, 1);
        assert_eq!(stats.difficulty, DEFAULT_DIFFICULTY);

        let genesis = ledger.block(0).unwrap();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.state, BlockState::Sealed);
        assert_eq!(genesis.transactions, vec![ReceiptHash::genesis()]);
    }

    #[test]
    fn test_append_opens_and_seals_blocks() {
        let mut ledger = Ledger::new(LedgerPolicy {
            block_capacity: 2,
            difficulty: DEFAULT_DIFFICULTY,
        });

        ledger.append_transaction(some_hash("a")).unwrap();
        let stats = ledger.chain_stats();
        assert_eq!(stats.chain_length, 1);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(ledger.block(1).unwrap().state, BlockState::Open);

        // Capacity reached: block 1 seals
        ledger.append_transaction(some_hash("b")).unwrap();
        assert_eq!(ledger.block(1).unwrap().state, BlockState::Sealed);
        assert_eq!(ledger.chain_stats().chain_length, 2);

        // The next append opens block 2
        ledger.append_transaction(some_hash("c")).unwrap();
        assert_eq!(ledger.block(2).unwrap().state, BlockState::Open);
        assert_eq!(ledger.chain_stats().total_transactions, 4);
    }

    #[test]
    fn test_chain_length_monotonic() {
        let mut ledger = Ledger::new(LedgerPolicy {
            block_capacity: 3,
            difficulty: DEFAULT_DIFFICULTY,
        });

        let mut last_length = 0;
        for i in 0..10 {
            ledger.append_transaction(some_hash(&i.to_string())).unwrap();
            let stats = ledger.chain_stats();
            assert!(stats.chain_length >= last_length);
            assert!(stats.chain_length >= 1);
            last_length = stats.chain_length;
        }

        assert_eq!(ledger.chain_stats().total_transactions, 11);
    }

    #[test]
    fn test_duplicate_append_rejected() {
        let mut ledger = Ledger::default();
        let hash = some_hash("a");

        ledger.append_transaction(hash).unwrap();
        assert!(matches!(
            ledger.append_transaction(hash),
            Err(Error::LedgerAppendFailure(_))
        ));

        // The failed append left nothing behind
        assert_eq!(ledger.chain_stats().total_transactions, 2);
    }

    #[test]
    fn test_missing_block_lookup() {
        let ledger = Ledger::default();
        assert!(ledger.block(7).is_none());
    }
}
