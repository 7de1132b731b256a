// utils/decimal.rs
use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

/// `SUM(bigint)` comes back from Postgres as NUMERIC, and as NULL over
/// zero rows.
pub trait BigDecimalHelpers {
    fn to_i64_or_zero(&self) -> i64;
}

impl BigDecimalHelpers for Option<BigDecimal> {
    fn to_i64_or_zero(&self) -> i64 {
        self.as_ref().and_then(ToPrimitive::to_i64).unwrap_or(0)
    }
}
