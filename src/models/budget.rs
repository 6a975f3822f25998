//! This file defines the `Budget` type, a monthly spending limit for one
//! expense category, and the `Month` key budgets and dashboard buckets are
//! grouped by.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::Date;

use crate::{
    Error,
    models::{Amount, CategoryId},
};

/// A newtype wrapper for integer budget IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetId(i64);

impl BudgetId {
    /// Create a budget ID from its integer form.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The integer form of the ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for BudgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BudgetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A calendar month, e.g. "2024-01".
///
/// Months order chronologically, which for the ISO `YYYY-MM` wire form
/// coincides with lexicographic string order. Budgets are keyed by month,
/// and the dashboard buckets transactions by the month of their date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u8,
}

impl Month {
    /// Create a month.
    ///
    /// # Errors
    ///
    /// Returns an error unless `month` is in `1..=12` and `year` is a
    /// four-digit year.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(Error::InvalidMonth(format!("{year}-{month}")));
        }

        Ok(Self { year, month })
    }

    /// The month a date falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year, 1 through 12.
    pub fn month(&self) -> u8 {
        self.month
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(s.to_owned());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;

        Month::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for Month {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A spending limit for one expense category in one month.
///
/// The backend accepts one budget per (category, month) pair in spirit but
/// does not enforce uniqueness, and neither does the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The budget's ID in the backend database.
    pub id: BudgetId,
    /// The expense category the limit applies to.
    pub category_id: CategoryId,
    /// The spending limit.
    pub amount: Amount,
    /// The month the limit applies to.
    pub month: Month,
}

/// The payload for setting a budget.
#[derive(Debug, Clone, Serialize)]
pub struct NewBudget {
    /// The expense category the limit applies to. The backend rejects
    /// income categories.
    pub category_id: CategoryId,
    /// The spending limit.
    pub amount: Amount,
    /// The month the limit applies to.
    pub month: Month,
}

#[cfg(test)]
mod month_tests {
    use time::macros::date;

    use crate::Error;

    use super::Month;

    #[test]
    fn new_fails_on_month_out_of_range() {
        let month = Month::new(2024, 13);

        assert_eq!(month, Err(Error::InvalidMonth("2024-13".to_owned())));
    }

    #[test]
    fn parses_and_displays_the_wire_form() {
        let month: Month = "2024-01".parse().unwrap();

        assert_eq!(month, Month::new(2024, 1).unwrap());
        assert_eq!(month.to_string(), "2024-01");
    }

    #[test]
    fn parse_rejects_garbage() {
        let result = "January 2024".parse::<Month>();

        assert_eq!(result, Err(Error::InvalidMonth("January 2024".to_owned())));
    }

    #[test]
    fn of_truncates_a_date_to_its_month() {
        let month = Month::of(date!(2024 - 03 - 31));

        assert_eq!(month, Month::new(2024, 3).unwrap());
    }

    #[test]
    fn months_order_chronologically() {
        let earlier: Month = "2023-12".parse().unwrap();
        let later: Month = "2024-01".parse().unwrap();

        assert!(earlier < later);
    }

    #[test]
    fn serializes_as_a_string() {
        let month = Month::new(2024, 7).unwrap();

        let json = serde_json::to_string(&month).unwrap();

        assert_eq!(json, r#""2024-07""#);
    }
}
