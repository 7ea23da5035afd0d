//! Health evaluation and liquidation triggers.
//!
//! A position's health state is derived, never stored: `{Healthy, AtRisk,
//! Liquidated}`. AtRisk is a pure function of the position and its current
//! risk snapshot; the transition to Liquidated only happens through an
//! explicit `liquidate` call that re-validates AtRisk at call time, so a
//! position that self-healed between detection and call is never liquidated.

use crate::position::{LendingPosition, RiskSnapshot};
use crate::types::Bps;
use serde::{Deserialize, Serialize};

/// Thresholds that flip a position from Healthy to AtRisk, and the
/// probability above which a risk update cascades into auto-liquidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationTriggers {
    // 0-100; AtRisk when the snapshot probability exceeds this
    pub at_risk_prob_threshold: u8,
    // AtRisk when the health factor drops below this (11000 = 110%)
    pub min_health_factor_bps: Bps,
    // 0-100; updateRiskAssessment auto-liquidates above this
    pub auto_liquidate_prob_threshold: u8,
}

impl Default for LiquidationTriggers {
    fn default() -> Self {
        Self {
            at_risk_prob_threshold: 80,
            min_health_factor_bps: Bps(11000),
            auto_liquidate_prob_threshold: 90,
        }
    }
}

/// Which trigger fired. a position can be at risk for several reasons at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTrigger {
    LtvAboveThreshold,
    LiquidationProbability,
    HealthFactorBelowFloor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy {
        ltv_bps: Bps,
        health_factor_bps: Bps,
    },
    AtRisk {
        ltv_bps: Bps,
        health_factor_bps: Bps,
        triggers: Vec<RiskTrigger>,
    },
    /// terminal; the position is inactive
    Liquidated,
}

impl HealthStatus {
    pub fn is_at_risk(&self) -> bool {
        matches!(self, HealthStatus::AtRisk { .. })
    }
}

/// Read-derived health state. AtRisk when current LTV exceeds the position's
/// liquidation threshold, OR the snapshot's liquidation probability exceeds
/// the trigger, OR the health factor is below the floor.
pub fn evaluate_health(
    position: &LendingPosition,
    snapshot: &RiskSnapshot,
    triggers: &LiquidationTriggers,
) -> HealthStatus {
    if !position.active {
        return HealthStatus::Liquidated;
    }

    let ltv = position.current_ltv_bps();
    let health = position.health_factor_bps();

    let mut fired = Vec::new();
    if ltv > position.liquidation_threshold_bps {
        fired.push(RiskTrigger::LtvAboveThreshold);
    }
    if snapshot.liquidation_probability > triggers.at_risk_prob_threshold {
        fired.push(RiskTrigger::LiquidationProbability);
    }
    if health < triggers.min_health_factor_bps {
        fired.push(RiskTrigger::HealthFactorBelowFloor);
    }

    if fired.is_empty() {
        HealthStatus::Healthy {
            ltv_bps: ltv,
            health_factor_bps: health,
        }
    } else {
        HealthStatus::AtRisk {
            ltv_bps: ltv,
            health_factor_bps: health,
            triggers: fired,
        }
    }
}
