// 7.0: receiver registry. destination chain id -> receiver endpoint identity.
// admin-writable only (the engine gates that); re-registration overwrites.
// the registry is injectable state, never an ambient global, so tests get
// per-test isolation.

use crate::types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiverRegistry {
    entries: HashMap<ChainId, Address>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the endpoint that was replaced, if any.
    pub fn register(&mut self, chain: ChainId, endpoint: Address) -> Option<Address> {
        self.entries.insert(chain, endpoint)
    }

    pub fn lookup(&self, chain: ChainId) -> Option<Address> {
        self.entries.get(&chain).copied()
    }

    pub fn is_registered(&self, chain: ChainId) -> bool {
        self.entries.contains_key(&chain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = ReceiverRegistry::new();
        assert!(registry.lookup(ChainId(2)).is_none());

        registry.register(ChainId(2), Address(100));
        assert_eq!(registry.lookup(ChainId(2)), Some(Address(100)));
        assert!(registry.is_registered(ChainId(2)));
    }

    #[test]
    fn reregistration_overwrites() {
        let mut registry = ReceiverRegistry::new();
        registry.register(ChainId(2), Address(100));

        let replaced = registry.register(ChainId(2), Address(200));
        assert_eq!(replaced, Some(Address(100)));
        assert_eq!(registry.lookup(ChainId(2)), Some(Address(200)));
        assert_eq!(registry.len(), 1);
    }
}
