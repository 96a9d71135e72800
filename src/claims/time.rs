//! Time claims (`exp`, `nbf`, `iat`)
//!
//! Every source representation (integer seconds, fractional seconds, or a
//! string holding either) is normalised into [`NumericDate`] before any
//! comparison runs. Values are truncated to microsecond precision.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Precision kept for time claims
pub const TIME_PRECISION: Duration = Duration::from_micros(1);

/// Seconds since the Unix epoch, as carried by time claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericDate(SystemTime);

impl NumericDate {
    /// Wrap `time`, truncated to [`TIME_PRECISION`]
    pub fn new(time: SystemTime) -> Self {
        Self(truncate(time))
    }

    pub fn now() -> Self {
        Self::new(SystemTime::now())
    }

    /// Whole seconds since the epoch; negative values lie before it
    pub fn from_seconds(seconds: i64) -> Result<Self> {
        let offset = Duration::from_secs(seconds.unsigned_abs());
        let time = if seconds >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        time.map(Self)
            .ok_or_else(|| Error::InvalidNumericDate(format!("{seconds} is out of range")))
    }

    /// Fractional seconds since the epoch
    pub fn from_secs_f64(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() {
            return Err(Error::InvalidNumericDate(format!("{seconds} is not finite")));
        }
        let offset = Duration::try_from_secs_f64(seconds.abs())
            .map_err(|e| Error::InvalidNumericDate(format!("{seconds}: {e}")))?;
        let time = if seconds >= 0.0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        time.map(Self::new)
            .ok_or_else(|| Error::InvalidNumericDate(format!("{seconds} is out of range")))
    }

    /// Normalise a JSON value: integer, float, or a string holding either
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(number) => {
                if let Some(seconds) = number.as_i64() {
                    Self::from_seconds(seconds)
                } else if let Some(seconds) = number.as_u64() {
                    UNIX_EPOCH
                        .checked_add(Duration::from_secs(seconds))
                        .map(Self)
                        .ok_or_else(|| {
                            Error::InvalidNumericDate(format!("{seconds} is out of range"))
                        })
                } else {
                    number
                        .as_f64()
                        .ok_or_else(|| Error::InvalidNumericDate(format!("{number} is not a number")))
                        .and_then(Self::from_secs_f64)
                }
            }
            Value::String(text) => Self::parse(text),
            other => Err(Error::InvalidNumericDate(format!(
                "expected a number, found {}",
                json_type(other)
            ))),
        }
    }

    fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Ok(seconds) = text.parse::<i64>() {
            return Self::from_seconds(seconds);
        }
        match text.parse::<f64>() {
            Ok(seconds) => Self::from_secs_f64(seconds),
            Err(_) => Err(Error::InvalidNumericDate(format!(
                "\"{text}\" is not a numeric string"
            ))),
        }
    }

    pub fn as_system_time(&self) -> SystemTime {
        self.0
    }

    /// Seconds since the epoch, including the fractional part
    pub fn as_secs_f64(&self) -> f64 {
        match self.0.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        }
    }

    /// Whole seconds if the value has no fractional part
    fn whole_seconds(&self) -> Option<i64> {
        match self.0.duration_since(UNIX_EPOCH) {
            Ok(after) if after.subsec_nanos() == 0 => i64::try_from(after.as_secs()).ok(),
            Err(before) if before.duration().subsec_nanos() == 0 => {
                i64::try_from(before.duration().as_secs()).ok().map(|s| -s)
            }
            _ => None,
        }
    }
}

impl From<SystemTime> for NumericDate {
    fn from(time: SystemTime) -> Self {
        Self::new(time)
    }
}

impl From<NumericDate> for SystemTime {
    fn from(date: NumericDate) -> Self {
        date.0
    }
}

impl fmt::Display for NumericDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.whole_seconds() {
            Some(seconds) => write!(f, "{seconds}"),
            None => write!(f, "{}", self.as_secs_f64()),
        }
    }
}

impl Serialize for NumericDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.whole_seconds() {
            Some(seconds) => serializer.serialize_i64(seconds),
            None => serializer.serialize_f64(self.as_secs_f64()),
        }
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Through `Value` so that every number representation is accepted
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}

fn truncate(time: SystemTime) -> SystemTime {
    let truncated = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => {
            UNIX_EPOCH.checked_add(Duration::new(after.as_secs(), after.subsec_micros() * 1000))
        }
        Err(before) => {
            let before = before.duration();
            UNIX_EPOCH.checked_sub(Duration::new(before.as_secs(), before.subsec_micros() * 1000))
        }
    };
    truncated.unwrap_or(time)
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(seconds: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(seconds)
    }

    #[test]
    fn test_integer_float_and_string_agree() {
        let expected = NumericDate::new(at(1_500_000_000));
        for value in [
            json!(1_500_000_000),
            json!(1_500_000_000.0),
            json!("1500000000"),
            json!(" 1500000000.0 "),
        ] {
            assert_eq!(NumericDate::from_value(&value).unwrap(), expected, "{value}");
        }
    }

    #[test]
    fn test_fraction_truncated_to_micros() {
        let date = NumericDate::new(at(10) + Duration::from_nanos(1_234_567));
        assert_eq!(date.as_system_time(), at(10) + Duration::from_micros(1_234));

        let date = NumericDate::from_value(&json!(10.5)).unwrap();
        assert_eq!(date.as_system_time(), at(10) + Duration::from_millis(500));
    }

    #[test]
    fn test_negative_seconds() {
        let date = NumericDate::from_seconds(-10).unwrap();
        assert_eq!(date.as_system_time(), UNIX_EPOCH - Duration::from_secs(10));
        assert_eq!(serde_json::to_value(date).unwrap(), json!(-10));
    }

    #[test]
    fn test_rejects_non_numeric() {
        for value in [json!("soon"), json!(true), json!([1]), json!({"s": 1}), json!("NaN")] {
            assert!(
                matches!(NumericDate::from_value(&value), Err(Error::InvalidNumericDate(_))),
                "{value}"
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(NumericDate::from_secs_f64(1e30).is_err());
        assert!(NumericDate::from_secs_f64(f64::INFINITY).is_err());
        assert!(NumericDate::from_value(&json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_serialize_whole_and_fractional() {
        let whole = NumericDate::new(at(1_500_000_000));
        assert_eq!(serde_json::to_string(&whole).unwrap(), "1500000000");

        let fractional = NumericDate::new(at(1) + Duration::from_millis(250));
        assert_eq!(serde_json::to_value(fractional).unwrap(), json!(1.25));
    }

    #[test]
    fn test_deserialize_from_json() {
        let dates: Vec<NumericDate> = serde_json::from_str(r#"[1, 1.5, "2"]"#).unwrap();
        assert_eq!(dates[0].as_system_time(), at(1));
        assert_eq!(dates[1].as_system_time(), at(1) + Duration::from_millis(500));
        assert_eq!(dates[2].as_system_time(), at(2));

        assert!(serde_json::from_str::<NumericDate>("\"later\"").is_err());
    }
}
