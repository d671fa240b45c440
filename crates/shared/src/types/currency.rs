//! Currency codes for account denomination.
//!
//! Balances are stored as integers in the smallest currency unit, so the code is
//! only ever used as a label; no conversion happens anywhere in the system.

use serde::{Deserialize, Serialize};

/// Three-letter ISO 4217 style currency code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

/// Error returned when a currency code is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency code: {0:?}")]
pub struct InvalidCurrencyCode(pub String);

impl CurrencyCode {
    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(InvalidCurrencyCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("USD", "USD")]
    #[case("eur", "EUR")]
    #[case(" idr ", "IDR")]
    fn test_parse_valid_codes(#[case] input: &str, #[case] expected: &str) {
        let code: CurrencyCode = input.parse().unwrap();
        assert_eq!(code.as_str(), expected);
        assert_eq!(code.to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("US")]
    #[case("USDT")]
    #[case("U$D")]
    #[case("12A")]
    fn test_parse_invalid_codes(#[case] input: &str) {
        assert_eq!(
            input.parse::<CurrencyCode>(),
            Err(InvalidCurrencyCode(input.to_string()))
        );
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let code: CurrencyCode = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(code.as_str(), "USD");
        assert!(serde_json::from_str::<CurrencyCode>("\"dollars\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"USD\"");
    }
}
