//! Payment reversal policy.

use chrono::NaiveDate;
use uuid::Uuid;

use super::error::FeeError;

/// Default number of days a payment stays reversible.
pub const DEFAULT_REVERSAL_WINDOW_DAYS: i64 = 30;

/// Rules for reversing a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReversalPolicy {
    /// Days after the payment date during which reversal is allowed.
    pub window_days: i64,
}

impl Default for ReversalPolicy {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_REVERSAL_WINDOW_DAYS,
        }
    }
}

impl ReversalPolicy {
    /// Creates a policy with the given window.
    #[must_use]
    pub const fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    /// Validates a reversal request and returns the trimmed reason.
    ///
    /// A payment dated exactly `window_days` ago is still reversible.
    ///
    /// # Errors
    ///
    /// - `FeeError::Required` if the reason is blank
    /// - `FeeError::ReversalWindowExpired` if the payment is too old
    pub fn validate(
        &self,
        payment_id: Uuid,
        payment_date: NaiveDate,
        reason: &str,
        today: NaiveDate,
    ) -> Result<String, FeeError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(FeeError::Required("reversal reason"));
        }

        if (today - payment_date).num_days() > self.window_days {
            return Err(FeeError::ReversalWindowExpired {
                payment_id,
                payment_date,
                window_days: self.window_days,
            });
        }

        Ok(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn test_within_window_allowed() {
        let policy = ReversalPolicy::default();
        for days in [0, 1, 29, 30] {
            let paid_on = today() - Duration::days(days);
            assert!(
                policy
                    .validate(Uuid::nil(), paid_on, "entered twice", today())
                    .is_ok(),
                "{days} days ago should be reversible"
            );
        }
    }

    #[test]
    fn test_outside_window_rejected() {
        let policy = ReversalPolicy::default();
        let paid_on = today() - Duration::days(31);
        let err = policy
            .validate(Uuid::nil(), paid_on, "entered twice", today())
            .unwrap_err();
        assert!(matches!(err, FeeError::ReversalWindowExpired { window_days: 30, .. }));
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_reason_required_and_trimmed() {
        let policy = ReversalPolicy::new(7);
        assert!(matches!(
            policy.validate(Uuid::nil(), today(), "  ", today()),
            Err(FeeError::Required(_))
        ));
        assert_eq!(
            policy
                .validate(Uuid::nil(), today(), "  bounced cheque ", today())
                .unwrap(),
            "bounced cheque"
        );
    }

    #[test]
    fn test_custom_window() {
        let policy = ReversalPolicy::new(7);
        let paid_on = today() - Duration::days(8);
        assert!(policy.validate(Uuid::nil(), paid_on, "x", today()).is_err());
    }
}
