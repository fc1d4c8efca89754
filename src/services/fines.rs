//! Fine assessment
//!
//! A pure calculation over the lending policy: no clock, no I/O. The
//! caller supplies both instants, which keeps the whole schedule unit-
//! testable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::PolicyConfig;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fine schedule derived from configuration
#[derive(Debug, Clone)]
pub struct FinePolicy {
    pub rate_per_day: Decimal,
    pub max: Decimal,
}

impl FinePolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            rate_per_day: config.fine_rate_per_day,
            max: config.fine_max,
        }
    }

    /// Fine owed for a book due at `due_at` and returned at `returned_at`.
    ///
    /// Every started day past the due date counts as a full day; the
    /// total is capped at `max`. Early and on-time returns owe nothing.
    pub fn fine_for(&self, due_at: DateTime<Utc>, returned_at: DateTime<Utc>) -> Decimal {
        let overdue_seconds = (returned_at - due_at).num_seconds();
        if overdue_seconds <= 0 {
            return Decimal::ZERO;
        }

        let days_overdue = (overdue_seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
        let amount = Decimal::from(days_overdue) * self.rate_per_day;
        amount.min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy() -> FinePolicy {
        FinePolicy {
            rate_per_day: Decimal::new(50, 2),
            max: Decimal::new(2000, 2),
        }
    }

    fn due() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn on_time_return_owes_nothing() {
        let due = due();
        assert_eq!(policy().fine_for(due, due), Decimal::ZERO);
    }

    #[test]
    fn early_return_owes_nothing() {
        let due = due();
        assert_eq!(policy().fine_for(due, due - Duration::days(1)), Decimal::ZERO);
    }

    #[test]
    fn one_day_late_owes_one_day() {
        let due = due();
        assert_eq!(
            policy().fine_for(due, due + Duration::days(1)),
            Decimal::new(50, 2)
        );
    }

    #[test]
    fn started_days_count_as_full_days() {
        let due = due();
        // 1 day + 1 hour late rounds up to 2 days
        assert_eq!(
            policy().fine_for(due, due + Duration::days(1) + Duration::hours(1)),
            Decimal::new(100, 2)
        );
        // one second late is already a chargeable day
        assert_eq!(
            policy().fine_for(due, due + Duration::seconds(1)),
            Decimal::new(50, 2)
        );
    }

    #[test]
    fn fine_is_capped() {
        let due = due();
        assert_eq!(
            policy().fine_for(due, due + Duration::days(50)),
            Decimal::new(2000, 2)
        );
        assert_eq!(
            policy().fine_for(due, due + Duration::days(500)),
            Decimal::new(2000, 2)
        );
    }

    #[test]
    fn three_days_late_owes_one_fifty() {
        let due = due();
        assert_eq!(
            policy().fine_for(due, due + Duration::days(3)),
            Decimal::new(150, 2)
        );
    }
}
