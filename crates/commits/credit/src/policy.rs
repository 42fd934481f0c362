use serde::{Deserialize, Serialize};

use crate::PolicyError;

/// Proportionality constants for credit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditPolicy {
    /// Credit earned per hour a commitment was kept before its deadline.
    #[serde(default = "default_rate")]
    pub early_credit_per_hour: f64,

    /// Credit lost per hour past the deadline.
    #[serde(default = "default_rate")]
    pub late_penalty_per_hour: f64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            early_credit_per_hour: default_rate(),
            late_penalty_per_hour: default_rate(),
        }
    }
}

impl CreditPolicy {
    /// Both rates must be positive and finite.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (name, value) in [
            ("early_credit_per_hour", self.early_credit_per_hour),
            ("late_penalty_per_hour", self.late_penalty_per_hour),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PolicyError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

fn default_rate() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        CreditPolicy::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_rates() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let policy = CreditPolicy {
                late_penalty_per_hour: bad,
                ..Default::default()
            };
            assert!(matches!(
                policy.validate(),
                Err(PolicyError::InvalidRate {
                    name: "late_penalty_per_hour",
                    ..
                })
            ));
        }
    }

    #[test]
    fn partial_config_uses_defaults() {
        let policy: CreditPolicy =
            serde_json::from_str(r#"{ "late_penalty_per_hour": 2.0 }"#).unwrap();
        assert_eq!(policy.early_credit_per_hour, 1.0);
        assert_eq!(policy.late_penalty_per_hour, 2.0);
    }
}
