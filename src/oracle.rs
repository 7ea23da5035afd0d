// Risk Oracle Client
//
// The ledger treats the external risk assessor as an untrusted, possibly-slow,
// possibly-failing collaborator. Whatever happens on the wire, admission must
// stay decidable: any failure or malformed payload collapses to one fixed
// conservative assessment, never a partial parse. The engine consults the
// oracle *before* taking the ledger lock, so a slow assessor cannot stall
// unrelated admissions.

use crate::admission::PositionDraft;
use crate::types::{Bps, ChainId};
use serde::{Deserialize, Serialize};

/// Normalized output of the risk assessor: four numbers, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, higher is riskier
    pub risk_score: u8,
    pub recommended_ltv_bps: Bps,
    /// 0-100
    pub liquidation_probability: u8,
    /// destination chain the assessor considers cheapest/safest to settle on
    pub optimized_chain: ChainId,
}

impl RiskAssessment {
    /// The fixed fallback used whenever the assessor fails or returns garbage:
    /// risk 50, liquidation probability 25, recommended LTV 60%.
    pub fn conservative_default(fallback_chain: ChainId) -> Self {
        Self {
            risk_score: 50,
            recommended_ltv_bps: Bps(6000),
            liquidation_probability: 25,
            optimized_chain: fallback_chain,
        }
    }

    /// Clamp out-of-range values instead of trusting the assessor.
    pub fn normalized(mut self) -> Self {
        self.risk_score = self.risk_score.min(100);
        self.liquidation_probability = self.liquidation_probability.min(100);
        if self.recommended_ltv_bps > Bps(10000) {
            self.recommended_ltv_bps = Bps(10000);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    Unavailable { reason: String },
    Malformed { reason: String },
}

/// Anything that can score a prospective position. No side effects.
pub trait RiskOracle {
    fn assess(&mut self, draft: &PositionDraft) -> Result<RiskAssessment, OracleError>;

    /// Never fails: substitutes the conservative default on any error.
    fn assess_or_default(&mut self, draft: &PositionDraft) -> RiskAssessment {
        match self.assess(draft) {
            Ok(assessment) => assessment.normalized(),
            Err(_) => RiskAssessment::conservative_default(draft.borrow_chain),
        }
    }
}

// wire shape of the external assessor's JSON response. the assessor reports
// the recommended LTV as a whole percentage, not bps.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    risk_score: i64,
    #[serde(rename = "recommendedLTV")]
    recommended_ltv: i64,
    liquidation_probability: i64,
    optimized_chain: u32,
}

/// Strict schema decode of an assessor payload. Any missing field, wrong type
/// or out-of-domain number falls back wholesale to the conservative default;
/// there is no best-effort partial parse.
pub fn decode_assessment(payload: &str, fallback_chain: ChainId) -> RiskAssessment {
    let raw: RawAssessment = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(_) => return RiskAssessment::conservative_default(fallback_chain),
    };

    if raw.risk_score < 0
        || raw.risk_score > 100
        || raw.liquidation_probability < 0
        || raw.liquidation_probability > 100
        || raw.recommended_ltv < 0
        || raw.recommended_ltv > 100
    {
        return RiskAssessment::conservative_default(fallback_chain);
    }

    RiskAssessment {
        risk_score: raw.risk_score as u8,
        recommended_ltv_bps: Bps(raw.recommended_ltv as u64 * 100),
        liquidation_probability: raw.liquidation_probability as u8,
        optimized_chain: ChainId(raw.optimized_chain),
    }
}

/// Oracle double that always returns the same assessment.
#[derive(Debug, Clone)]
pub struct StaticOracle {
    pub assessment: RiskAssessment,
    pub calls: usize,
}

impl StaticOracle {
    pub fn new(assessment: RiskAssessment) -> Self {
        Self {
            assessment,
            calls: 0,
        }
    }
}

impl RiskOracle for StaticOracle {
    fn assess(&mut self, _draft: &PositionDraft) -> Result<RiskAssessment, OracleError> {
        self.calls += 1;
        Ok(self.assessment)
    }
}

/// Oracle double that always fails, forcing the conservative fallback.
#[derive(Debug, Default)]
pub struct FailingOracle;

impl RiskOracle for FailingOracle {
    fn assess(&mut self, _draft: &PositionDraft) -> Result<RiskAssessment, OracleError> {
        Err(OracleError::Unavailable {
            reason: "assessor offline".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Amount, TokenId};
    use rust_decimal_macros::dec;

    fn draft() -> PositionDraft {
        PositionDraft {
            owner: Address(1),
            collateral_amount: Amount::new_unchecked(dec!(100)),
            borrowed_amount: Amount::new_unchecked(dec!(50)),
            collateral_chain: ChainId(1),
            borrow_chain: ChainId(2),
            collateral_token: TokenId::NATIVE,
            borrow_token: TokenId::NATIVE,
        }
    }

    #[test]
    fn decode_well_formed_payload() {
        let payload = r#"{
            "riskScore": 45,
            "recommendedLTV": 70,
            "liquidationProbability": 15,
            "optimizedChain": 2
        }"#;

        let assessment = decode_assessment(payload, ChainId(1));
        assert_eq!(assessment.risk_score, 45);
        assert_eq!(assessment.recommended_ltv_bps, Bps(7000));
        assert_eq!(assessment.liquidation_probability, 15);
        assert_eq!(assessment.optimized_chain, ChainId(2));
    }

    #[test]
    fn malformed_payload_falls_back() {
        for bad in [
            "not json at all",
            "{}",
            r#"{"riskScore": 45}"#,
            r#"{"riskScore": "high", "recommendedLTV": 70, "liquidationProbability": 15, "optimizedChain": 2}"#,
        ] {
            let assessment = decode_assessment(bad, ChainId(3));
            assert_eq!(assessment, RiskAssessment::conservative_default(ChainId(3)));
        }
    }

    #[test]
    fn out_of_domain_values_fall_back() {
        let payload = r#"{
            "riskScore": 145,
            "recommendedLTV": 70,
            "liquidationProbability": 15,
            "optimizedChain": 2
        }"#;

        let assessment = decode_assessment(payload, ChainId(1));
        assert_eq!(assessment, RiskAssessment::conservative_default(ChainId(1)));
    }

    #[test]
    fn conservative_default_values() {
        let d = RiskAssessment::conservative_default(ChainId(9));
        assert_eq!(d.risk_score, 50);
        assert_eq!(d.liquidation_probability, 25);
        assert_eq!(d.recommended_ltv_bps, Bps(6000));
        assert_eq!(d.optimized_chain, ChainId(9));
    }

    #[test]
    fn failing_oracle_substitutes_default() {
        let mut oracle = FailingOracle;
        let d = draft();

        let assessment = oracle.assess_or_default(&d);
        assert_eq!(
            assessment,
            RiskAssessment::conservative_default(d.borrow_chain)
        );
    }

    #[test]
    fn normalized_clamps() {
        let wild = RiskAssessment {
            risk_score: 250,
            recommended_ltv_bps: Bps(20000),
            liquidation_probability: 101,
            optimized_chain: ChainId(1),
        }
        .normalized();

        assert_eq!(wild.risk_score, 100);
        assert_eq!(wild.liquidation_probability, 100);
        assert_eq!(wild.recommended_ltv_bps, Bps(10000));
    }
}
