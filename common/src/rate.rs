//! Persisted rate observation type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::currency::CurrencyCode;
use crate::time::{now, Timestamp};

/// One timestamped measurement of a base -> target exchange rate.
///
/// Observations are immutable once created and form an append-only history;
/// multiple observations may exist for the same pair at different
/// timestamps, and "latest" is determined by `observed_at` ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateObservation {
    /// The currency the rate is quoted from.
    pub base: CurrencyCode,
    /// The currency the rate is quoted into.
    pub target: CurrencyCode,
    /// Rate value (exact decimal, non-negative).
    pub value: Decimal,
    /// When this rate was observed.
    pub observed_at: Timestamp,
}

impl RateObservation {
    /// Create a new observation stamped with the current time.
    pub fn new(base: CurrencyCode, target: CurrencyCode, value: Decimal) -> Self {
        Self {
            base,
            target,
            value,
            observed_at: now(),
        }
    }

    /// Create an observation with an explicit timestamp.
    pub fn observed(
        base: CurrencyCode,
        target: CurrencyCode,
        value: Decimal,
        observed_at: Timestamp,
    ) -> Self {
        Self {
            base,
            target,
            value,
            observed_at,
        }
    }
}

impl fmt::Display for RateObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} = {} @ {}",
            self.base, self.target, self.value, self.observed_at
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = now();
        let obs = RateObservation::new(code("USD"), code("EUR"), dec!(0.85));
        assert!(obs.observed_at >= before);
        assert_eq!(obs.value, dec!(0.85));
    }

    #[test]
    fn test_value_equality_is_numeric() {
        // 0.85 and 0.850 are the same rate.
        assert_eq!(dec!(0.85), dec!(0.850));
    }
}
