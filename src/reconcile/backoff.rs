//! Backoff policy and duration parsing.

use super::ReconcileError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parse a human-readable duration string into a [`Duration`].
///
/// Supported suffixes: `ms` (milliseconds), `s` (seconds), `m` (minutes),
/// `h` (hours).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, ReconcileError> {
    let s = s.trim();
    let invalid = || ReconcileError::InvalidDuration(s.to_string());

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if s.ends_with('s') || s.ends_with('m') || s.ends_with('h') {
        (&s[..s.len() - 1], &s[s.len() - 1..])
    } else {
        return Err(invalid());
    };

    let value: u64 = num_str.trim().parse().map_err(|_| invalid())?;

    let secs = match unit {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => Some(value),
        "m" => value.checked_mul(60),
        "h" => value.checked_mul(3600),
        _ => None,
    };
    secs.map(Duration::from_secs).ok_or_else(invalid)
}

/// Render a duration in the form [`parse_duration`] accepts.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// Serde adapter storing durations as human-readable strings.
pub(crate) mod human {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Serialize a delay list as milliseconds.
pub(crate) fn serialize_millis<S: serde::Serializer>(
    delays: &[Duration],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(delays.iter().map(Duration::as_millis))
}

/// Exponential backoff between poll attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BackoffPolicy {
    /// Delay after the first unsatisfied attempt (e.g. `1s`, `500ms`)
    #[serde(with = "human")]
    #[schemars(with = "String")]
    pub initial_delay: Duration,
    /// Factor applied to the delay after every attempt
    pub multiplier: f64,
    /// Ceiling for any single delay
    #[serde(with = "human")]
    #[schemars(with = "String")]
    pub max_delay: Duration,
    /// Attempts before giving up
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.max_attempts == 0 {
            return Err(ReconcileError::InvalidBackoff(
                "maxAttempts must be at least 1".to_string(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ReconcileError::InvalidBackoff(format!(
                "multiplier must be a finite number >= 1, got {}",
                self.multiplier
            )));
        }
        if self.initial_delay > self.max_delay {
            return Err(ReconcileError::InvalidBackoff(format!(
                "initialDelay {} exceeds maxDelay {}",
                format_duration(self.initial_delay),
                format_duration(self.max_delay)
            )));
        }
        Ok(())
    }

    /// Delay that follows `current`, capped at `max_delay`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .map_or(self.max_delay, |next| next.min(self.max_delay))
    }

    /// First delay, capped at `max_delay`.
    #[must_use]
    pub fn first_delay(&self) -> Duration {
        self.initial_delay.min(self.max_delay)
    }

    /// Every delay the poller would sleep, in order: one after each
    /// unsatisfied attempt except the last.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        let count = self.max_attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.first_delay()), |d| Some(self.next_delay(*d)))
            .take(count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").expect("parse"), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").expect("parse"), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").expect("parse"), Duration::from_secs(3600));
        assert_eq!(parse_duration("500ms").expect("parse"), Duration::from_millis(500));
        assert_eq!(parse_duration("  10s  ").expect("parse"), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_duration_invalid() {
        for bad in ["", "100", "10x", "abcs", "-1s"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_parse_duration_overflow_is_invalid() {
        assert!(matches!(
            parse_duration("999999999999999999m"),
            Err(ReconcileError::InvalidDuration(_))
        ));
        assert!(parse_duration("99999999999999999h").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s").expect("parse"),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_format_round_trip() {
        for d in [Duration::from_secs(30), Duration::from_millis(1500), Duration::ZERO] {
            assert_eq!(parse_duration(&format_duration(d)).expect("parse"), d);
        }
    }

    #[test]
    fn test_default_schedule() {
        let millis: Vec<u128> = BackoffPolicy::default()
            .schedule()
            .iter()
            .map(Duration::as_millis)
            .collect();
        assert_eq!(millis, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000, 30000]);
    }

    #[test]
    fn test_single_attempt_has_no_delay() {
        assert!(BackoffPolicy::default().with_max_attempts(1).schedule().is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(BackoffPolicy::default().validate().is_ok());
        assert!(BackoffPolicy::default().with_max_attempts(0).validate().is_err());
        assert!(BackoffPolicy::default().with_multiplier(0.5).validate().is_err());
        assert!(BackoffPolicy::default()
            .with_initial_delay(Duration::from_secs(60))
            .validate()
            .is_err());
    }

    #[test]
    fn test_yaml_form() {
        let policy: BackoffPolicy =
            serde_yaml::from_str("initialDelay: 500ms\nmaxDelay: 10s\n").expect("deserialize");
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, 10);

        let yaml = serde_yaml::to_string(&BackoffPolicy::default()).expect("serialize");
        assert!(yaml.contains("initialDelay: 1s"));
    }
}
