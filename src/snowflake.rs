//! Time-ordered 64-bit message and channel ids.
//!
//! The platform encodes the creation time in the high 42 bits of every id, so
//! ids can be compared to find the oldest message on a page and a cutoff date
//! can be turned into an id bound for search. Ids routinely exceed 2^53, which
//! is why they travel as decimal strings and are only ever compared as `u64`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milliseconds between the Unix epoch and the platform epoch (2015-01-01T00:00:00Z).
pub const PLATFORM_EPOCH_MS: i64 = 1_420_070_400_000;

const TIMESTAMP_SHIFT: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Snowflake(u64);

impl Snowflake {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Smallest id that could have been minted at `at`.
    ///
    /// Instants before the platform epoch saturate to id 0.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let offset = at.timestamp_millis().saturating_sub(PLATFORM_EPOCH_MS).max(0) as u64;
        Self(offset << TIMESTAMP_SHIFT)
    }

    /// Creation instant encoded in the id.
    pub fn timestamp(self) -> DateTime<Utc> {
        let ms = (self.0 >> TIMESTAMP_SHIFT) as i64 + PLATFORM_EPOCH_MS;
        DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// The id immediately below this one, saturating at 0.
    pub fn pred(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid snowflake '{0}': expected a decimal 64-bit unsigned integer")]
pub struct ParseSnowflakeError(String);

impl FromStr for Snowflake {
    type Err = ParseSnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseSnowflakeError(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ParseSnowflakeError(s.to_string()))
    }
}

impl TryFrom<String> for Snowflake {
    type Error = ParseSnowflakeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Snowflake> for String {
    fn from(value: Snowflake) -> Self {
        value.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_platform_epoch_maps_to_zero() {
        let epoch = Utc.timestamp_millis_opt(PLATFORM_EPOCH_MS).unwrap();
        assert_eq!(Snowflake::from_datetime(epoch).get(), 0);
    }

    #[test]
    fn test_before_epoch_saturates() {
        let early = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Snowflake::from_datetime(early).get(), 0);
    }

    #[test]
    fn test_known_id_timestamp() {
        // 175928847299117063 was minted at 2016-04-30T11:18:25.796Z
        let id: Snowflake = "175928847299117063".parse().unwrap();
        assert_eq!(id.timestamp().timestamp_millis(), 1_462_015_105_796);
    }

    #[test]
    fn test_from_datetime_inverts_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let id = Snowflake::from_datetime(at);
        assert_eq!(id.timestamp(), at);
    }

    #[test]
    fn test_ordering_is_numeric_not_lexical() {
        let small: Snowflake = "999999999999999999".parse().unwrap();
        let large: Snowflake = "1000000000000000000".parse().unwrap();
        assert!(small < large);
        assert!("999999999999999999" > "1000000000000000000");
    }

    #[test]
    fn test_values_beyond_double_precision_survive() {
        let raw = "1234567890123456789";
        let id: Snowflake = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(id.pred().to_string(), "1234567890123456788");
    }

    #[test]
    fn test_pred_saturates_at_zero() {
        assert_eq!(Snowflake::new(0).pred().get(), 0);
    }

    #[test]
    fn test_parse_rejects_non_decimal() {
        assert!("".parse::<Snowflake>().is_err());
        assert!("-5".parse::<Snowflake>().is_err());
        assert!("12a".parse::<Snowflake>().is_err());
        assert!("1e18".parse::<Snowflake>().is_err());
        assert!("18446744073709551616".parse::<Snowflake>().is_err());
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let id: Snowflake = serde_json::from_str(r#""1234567890123456789""#).unwrap();
        assert_eq!(id.get(), 1_234_567_890_123_456_789);
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""1234567890123456789""#);
        assert!(serde_json::from_str::<Snowflake>("12").is_err());
    }
}
