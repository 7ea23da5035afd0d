// 1.0: all the primitives live here. nothing in the ledger works without these types.
// IDs, chains, addresses, amounts, basis points, timestamps. each is a newtype so the
// compiler catches type mixups between, say, a chain id and a position id.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// 1.1: execution domain identifier. the ledger itself runs on one chain
// (the "local" chain); borrows may settle on any other registered chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u32);

// 1.2: opaque account identity. the zero address is reserved and never a
// valid receiver endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    pub const ZERO: Address = Address(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// 1.3: asset identifier. zero denotes the chain's native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u64);

impl TokenId {
    pub const NATIVE: TokenId = TokenId(0);

    pub fn is_native(&self) -> bool {
        self.0 == 0
    }
}

// 1.4: non-negative token quantity in base units. collateral, borrows and
// reserves all use this. construction enforces the sign invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: Amount) -> Self {
        Self(self.0 + other.0)
    }

    // None when the subtraction would go negative
    #[must_use]
    pub fn checked_sub(&self, other: Amount) -> Option<Self> {
        if self.0 >= other.0 {
            Some(Self(self.0 - other.0))
        } else {
            None
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.5: basis points. 10000 bps = 100%. Bps::MAX stands in for an infinite
// health factor (zero borrowed amount).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bps(pub u64);

impl Bps {
    pub const MAX: Bps = Bps(u64::MAX);

    pub fn new(bps: u64) -> Self {
        Self(bps)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::from(self.0) / dec!(10000)
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

// 1.6: floor(num * 10000 / den) with division-by-zero and decimal overflow
// both saturating to Bps::MAX. both LTV and health factor reduce to this
// ratio, so saturation here is what turns an absurd draft into a policy
// rejection instead of a panic.
pub fn floor_ratio_bps(num: Amount, den: Amount) -> Bps {
    if den.is_zero() {
        return Bps::MAX;
    }
    // scale first for precision; if that overflows, divide first and accept
    // the coarser quotient. overflow on both paths means the ratio is far
    // beyond any policy ceiling anyway.
    let scaled = num
        .value()
        .checked_mul(dec!(10000))
        .and_then(|s| s.checked_div(den.value()))
        .or_else(|| {
            num.value()
                .checked_div(den.value())
                .and_then(|q| q.checked_mul(dec!(10000)))
        });
    match scaled.and_then(|s| s.floor().to_u64()) {
        Some(v) => Bps(v),
        None => Bps::MAX,
    }
}

// 1.7: millisecond timestamp. the engine runs on a logical clock so tests
// and simulations control time explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}
