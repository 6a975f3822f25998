//! This file defines the `Goal` type, a savings target the user pays into
//! over time.

use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    models::{Amount, transaction::iso_date},
};

/// A newtype wrapper for integer goal IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoalId(i64);

impl GoalId {
    /// Create a goal ID from its integer form.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The integer form of the ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GoalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A savings goal, e.g. 'Emergency fund' or 'Holiday'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// The goal's ID in the backend database.
    pub id: GoalId,
    /// The display name.
    pub name: String,
    /// How much the user wants to save in total.
    pub target_amount: Amount,
    /// How much has been put aside so far. May be zero.
    pub current_amount: Decimal,
    /// When the user wants to reach the target, if they set a date.
    #[serde(default, with = "iso_date::option")]
    pub deadline: Option<Date>,
}

impl Goal {
    /// Progress towards the target as a percentage, clamped to 100 for
    /// display. A zero target counts as no progress.
    pub fn progress_percent(&self) -> Decimal {
        let target = self.target_amount.get();
        if target <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let percent = self.current_amount / target * Decimal::ONE_HUNDRED;
        percent.min(Decimal::ONE_HUNDRED)
    }
}

/// The payload for creating a goal.
#[derive(Debug, Clone, Serialize)]
pub struct NewGoal {
    /// The display name.
    pub name: String,
    /// How much the user wants to save in total.
    pub target_amount: Amount,
    /// How much is already put aside. Defaults to zero in the original form.
    pub current_amount: Decimal,
    /// When the user wants to reach the target.
    #[serde(with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Date>,
}

impl NewGoal {
    /// Create a goal payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty.
    pub fn new(
        name: &str,
        target_amount: Amount,
        current_amount: Decimal,
        deadline: Option<Date>,
    ) -> Result<Self, Error> {
        if name.trim().is_empty() {
            return Err(Error::EmptyName("goal name"));
        }

        Ok(Self {
            name: name.to_owned(),
            target_amount,
            current_amount,
            deadline,
        })
    }
}

#[cfg(test)]
mod progress_tests {
    use rust_decimal::Decimal;

    use crate::models::Amount;

    use super::{Goal, GoalId};

    fn goal_with(target: Decimal, current: Decimal) -> Goal {
        Goal {
            id: GoalId::new(1),
            name: "Emergency fund".to_owned(),
            target_amount: Amount::new_unchecked(target),
            current_amount: current,
            deadline: None,
        }
    }

    #[test]
    fn progress_is_a_percentage_of_the_target() {
        let goal = goal_with(Decimal::new(200, 0), Decimal::new(50, 0));

        assert_eq!(goal.progress_percent(), Decimal::new(25, 0));
    }

    #[test]
    fn progress_clamps_at_one_hundred_percent() {
        let goal = goal_with(Decimal::new(100, 0), Decimal::new(150, 0));

        assert_eq!(goal.progress_percent(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn zero_target_counts_as_no_progress() {
        let goal = goal_with(Decimal::ZERO, Decimal::new(50, 0));

        assert_eq!(goal.progress_percent(), Decimal::ZERO);
    }
}
