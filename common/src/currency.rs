//! Currency types for the exchange-rate service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when parsing a currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid currency code {input:?}: must be exactly 3 uppercase ASCII letters")]
pub struct CodeError {
    /// The rejected input.
    pub input: String,
}

/// ISO 4217 style currency code: exactly 3 uppercase ASCII letters.
///
/// The natural key for every currency reference in the system. Construction
/// goes through [`CurrencyCode::parse`], which enforces the format; callers
/// holding user input normalize case before parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, rejecting anything that is not exactly
    /// 3 uppercase ASCII letters.
    pub fn parse(code: impl Into<String>) -> Result<Self, CodeError> {
        let code = code.into();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(CodeError { input: code })
        }
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// A registered currency.
///
/// Owned by the currency registry; the rate subsystem treats it as
/// read-only, looked up by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Unique currency code.
    pub code: CurrencyCode,
    /// Human-readable name, e.g. "US Dollar".
    pub name: String,
}

impl Currency {
    /// Create a new currency.
    pub fn new(code: CurrencyCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_valid_code() {
        let code = CurrencyCode::parse("USD").unwrap();
        assert_eq!(code.as_str(), "USD");
        assert_eq!(code.to_string(), "USD");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(CurrencyCode::parse("usd").is_err());
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("USDX").is_err());
        assert!(CurrencyCode::parse("U1D").is_err());
        assert!(CurrencyCode::parse("").is_err());
        assert!(CurrencyCode::parse("U D").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let code: CurrencyCode = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(code.as_str(), "EUR");
        assert!(serde_json::from_str::<CurrencyCode>("\"eur\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"EUR\"");
    }

    proptest! {
        #[test]
        fn parse_accepts_exactly_three_uppercase(code in "[A-Z]{3}") {
            let parsed = CurrencyCode::parse(code.clone()).unwrap();
            prop_assert_eq!(parsed.as_str(), code.as_str());
        }

        #[test]
        fn parse_rejects_wrong_length(code in "[A-Z]{0,2}|[A-Z]{4,8}") {
            prop_assert!(CurrencyCode::parse(code).is_err());
        }
    }
}
