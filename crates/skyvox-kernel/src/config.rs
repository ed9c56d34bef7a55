//! [`PolicyConfig`] – tunables for the policy gate.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use skyvox_types::SkyError;

/// Rate-limit and confirmation settings for one [`PolicyGate`].
///
/// The defaults are sized for a human operator talking at a normal cadence;
/// tests override them with small values.
///
/// [`PolicyGate`]: crate::policy_gate::PolicyGate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum commands a session may issue within the window.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: usize,

    /// Length of the sliding rate-limit window, in seconds.
    #[serde(default = "default_rate_limit_window_seconds")]
    pub rate_limit_window_seconds: f64,

    /// How long a pending confirmation stays redeemable, in seconds.
    #[serde(default = "default_confirmation_timeout_seconds")]
    pub confirmation_timeout_seconds: f64,
}

fn default_rate_limit_max() -> usize {
    30
}
fn default_rate_limit_window_seconds() -> f64 {
    60.0
}
fn default_confirmation_timeout_seconds() -> f64 {
    15.0
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_seconds: default_rate_limit_window_seconds(),
            confirmation_timeout_seconds: default_confirmation_timeout_seconds(),
        }
    }
}

impl PolicyConfig {
    pub fn rate_limit_window(&self) -> Duration {
        seconds(self.rate_limit_window_seconds)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        seconds(self.confirmation_timeout_seconds)
    }

    /// Reject settings that would make the gate unusable.
    ///
    /// # Errors
    ///
    /// [`SkyError::Config`] when `rate_limit_max` is zero or a duration is
    /// negative, NaN, or infinite.
    pub fn validate(&self) -> Result<(), SkyError> {
        if self.rate_limit_max == 0 {
            return Err(SkyError::Config(
                "rate_limit_max must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("rate_limit_window_seconds", self.rate_limit_window_seconds),
            ("confirmation_timeout_seconds", self.confirmation_timeout_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SkyError::Config(format!(
                    "{name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_generous() {
        let cfg = PolicyConfig::default();
        assert!(cfg.rate_limit_max >= 10);
        assert!(cfg.rate_limit_window() >= Duration::from_secs(10));
        assert!(cfg.confirmation_timeout() >= Duration::from_secs(5));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn fractional_seconds_convert() {
        let cfg = PolicyConfig {
            confirmation_timeout_seconds: 0.1,
            ..Default::default()
        };
        assert_eq!(cfg.confirmation_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn invalid_durations_fall_back_to_zero() {
        let cfg = PolicyConfig {
            rate_limit_window_seconds: -1.0,
            confirmation_timeout_seconds: f64::NAN,
            ..Default::default()
        };
        assert_eq!(cfg.rate_limit_window(), Duration::ZERO);
        assert_eq!(cfg.confirmation_timeout(), Duration::ZERO);
        assert!(matches!(cfg.validate(), Err(SkyError::Config(_))));
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let cfg = PolicyConfig {
            rate_limit_max: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SkyError::Config(_))));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: PolicyConfig = toml::from_str("rate_limit_max = 5").unwrap();
        assert_eq!(cfg.rate_limit_max, 5);
        assert_eq!(cfg.rate_limit_window_seconds, 60.0);
        assert_eq!(cfg.confirmation_timeout_seconds, 15.0);
    }
}
