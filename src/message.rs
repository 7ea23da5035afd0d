// 5.0: settlement messages. the wire unit between the dispatcher on the
// ledger chain and a receiver on a destination chain. delivery may duplicate;
// the dedup hash is the receiver's only defense, so it must be stable across
// processes and runs (SHA-256 over every field, in a fixed order).

use crate::types::{Address, Amount, ChainId, PositionId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Borrow,
    Liquidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementMessage {
    pub kind: MessageKind,
    pub position_id: PositionId,
    pub owner: Address,
    pub amount: Amount,
    pub token: TokenId,
    pub source_chain: ChainId,
    pub target_chain: ChainId,
    pub issued_at: Timestamp,
}

impl SettlementMessage {
    // 5.1: stable content hash used by receivers for idempotence. two
    // messages with identical fields are the same delivery.
    pub fn dedup_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(match self.kind {
            MessageKind::Borrow => [0u8],
            MessageKind::Liquidate => [1u8],
        });
        hasher.update(self.position_id.0.to_le_bytes());
        hasher.update(self.owner.0.to_le_bytes());
        hasher.update(self.amount.value().to_string().as_bytes());
        hasher.update(self.token.0.to_le_bytes());
        hasher.update(self.source_chain.0.to_le_bytes());
        hasher.update(self.target_chain.0.to_le_bytes());
        hasher.update(self.issued_at.as_millis().to_le_bytes());
        hex::encode(hasher.finalize())
    }
}
