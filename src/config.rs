// 10.0 config.rs: all settings in one place. admission policy, liquidation
// triggers, chain topology, yield table, event buffer bound.
// 10.1 presets mirror how the protocol is deployed: a default three-chain
// topology, a conservative variant, and a permissive one for testing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::admission::AdmissionPolicy;
use crate::liquidation::LiquidationTriggers;
use crate::types::{Bps, ChainId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    // the chain this ledger instance runs on
    pub local_chain: ChainId,
    // the chain universe the protocol recognizes; a chain becomes usable for
    // cross-chain borrows once a receiver is registered for it
    pub supported_chains: BTreeSet<ChainId>,
    pub policy: AdmissionPolicy,
    pub triggers: LiquidationTriggers,
    // informational APY per borrow chain, stamped onto positions at creation
    pub yield_rates: HashMap<ChainId, Bps>,
    pub default_yield_rate_bps: Bps,
    // audit buffer bound; oldest events are dropped past this
    pub max_events: usize,
    // echo events to stdout
    pub verbose: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        // the deployed protocol fixes three chains; the model generalizes to N
        let supported_chains: BTreeSet<ChainId> =
            [ChainId(1), ChainId(2), ChainId(3)].into_iter().collect();

        let mut yield_rates = HashMap::new();
        yield_rates.insert(ChainId(1), Bps(380));
        yield_rates.insert(ChainId(2), Bps(450));
        yield_rates.insert(ChainId(3), Bps(520));

        Self {
            local_chain: ChainId(1),
            supported_chains,
            policy: AdmissionPolicy::default(),
            triggers: LiquidationTriggers::default(),
            yield_rates,
            default_yield_rate_bps: Bps(300),
            max_events: 10_000,
            verbose: false,
        }
    }
}

impl LedgerConfig {
    pub fn conservative() -> Self {
        let mut config = Self::default();
        config.policy.max_ltv_bps = Bps(7000);
        config.policy.risk_score_ceiling = 70;
        config.policy.liquidation_prob_ceiling = 35;
        config.policy.liquidation_threshold_bps = Bps(6500);
        config.triggers.min_health_factor_bps = Bps(12500);
        config
    }

    pub fn permissive() -> Self {
        let mut config = Self::default();
        config.policy.max_ltv_bps = Bps(9500);
        config.policy.risk_score_ceiling = 95;
        config.policy.liquidation_prob_ceiling = 80;
        config
    }

    pub fn yield_rate(&self, borrow_chain: ChainId) -> Bps {
        self.yield_rates
            .get(&borrow_chain)
            .copied()
            .unwrap_or(self.default_yield_rate_bps)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.max_ltv_bps.value() == 0 || self.policy.max_ltv_bps > Bps(10000) {
            return Err(ConfigError::InvalidPolicy {
                reason: "max LTV must be in (0, 10000] bps".to_string(),
            });
        }

        if self.policy.liquidation_threshold_bps > self.policy.max_ltv_bps {
            return Err(ConfigError::InvalidPolicy {
                reason: "liquidation threshold must not exceed max LTV".to_string(),
            });
        }

        if self.policy.risk_score_ceiling > 100 || self.policy.liquidation_prob_ceiling > 100 {
            return Err(ConfigError::InvalidPolicy {
                reason: "score ceilings are 0-100".to_string(),
            });
        }

        if self.triggers.at_risk_prob_threshold > self.triggers.auto_liquidate_prob_threshold {
            return Err(ConfigError::InvalidTriggers {
                reason: "auto-liquidate threshold must not be below the at-risk threshold"
                    .to_string(),
            });
        }

        // floor of exactly 10000 = liquidation only at insolvency
        if self.triggers.min_health_factor_bps < Bps(10000) {
            return Err(ConfigError::InvalidTriggers {
                reason: "health factor floor must be at least 10000 bps".to_string(),
            });
        }

        if !self.supported_chains.contains(&self.local_chain) {
            return Err(ConfigError::InvalidTopology {
                reason: "local chain must be in the supported set".to_string(),
            });
        }

        if self.max_events == 0 {
            return Err(ConfigError::InvalidPolicy {
                reason: "event buffer must hold at least one event".to_string(),
            });
        }

        Ok(())
    }

    pub fn max_ltv_fraction(&self) -> Decimal {
        self.policy.max_ltv_bps.as_fraction()
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPolicy { reason: String },
    InvalidTriggers { reason: String },
    InvalidTopology { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_config_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn presets_valid() {
        assert!(LedgerConfig::conservative().validate().is_ok());
        assert!(LedgerConfig::permissive().validate().is_ok());
    }

    #[test]
    fn yield_rate_lookup_with_fallback() {
        let config = LedgerConfig::default();
        assert_eq!(config.yield_rate(ChainId(2)), Bps(450));
        assert_eq!(config.yield_rate(ChainId(99)), Bps(300));
    }

    #[test]
    fn threshold_above_max_ltv_rejected() {
        let mut config = LedgerConfig::default();
        config.policy.liquidation_threshold_bps = Bps(9000); // > 8500 max LTV
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn local_chain_must_be_supported() {
        let mut config = LedgerConfig::default();
        config.local_chain = ChainId(42);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn max_ltv_fraction() {
        assert_eq!(LedgerConfig::default().max_ltv_fraction(), dec!(0.85));
    }

    #[test]
    fn config_serialization() {
        let config = LedgerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LedgerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.local_chain, config.local_chain);
        assert_eq!(back.policy.max_ltv_bps, config.policy.max_ltv_bps);
    }
}
