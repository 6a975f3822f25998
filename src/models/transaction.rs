//! This file defines the `Transaction` type, the core type of the
//! book-keeping part of the application, and the payloads for creating,
//! updating, and querying transactions.

use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, models::CategoryId};

/// A newtype wrapper for integer transaction IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Create a transaction ID from its integer form.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The integer form of the ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Whether money came in or went out.
///
/// Categories carry the same tag, and a transaction's category should match
/// its kind. The client enforces this only by filtering category choices in
/// forms; the backend rejects mismatches outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// The lowercase wire form, e.g. for query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(Error::UnexpectedResponse(format!(
                "\"{s}\" is not a transaction kind (expected \"income\" or \"expense\")"
            ))),
        }
    }
}

/// A positive amount of money.
///
/// Amounts are decimal so that summation never round-trips through binary
/// floating point. Over the wire they travel as JSON numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountNotPositive] if `value` is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            Err(Error::AmountNotPositive)
        } else {
            Ok(Self(value))
        }
    }

    /// Create an amount without validation.
    ///
    /// The caller should ensure the value is positive. Violating the
    /// invariant will produce wrong aggregates but nothing worse.
    pub fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal value.
    pub fn get(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s
            .parse()
            .map_err(|_| Error::InvalidAmount(s.to_owned()))?;
        Amount::new(value)
    }
}

/// Serializes a [time::Date] as an ISO `YYYY-MM-DD` string, the format the
/// backend sends and expects for calendar days.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    /// Calendar date format, e.g. "2024-01-15".
    pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }

    /// The same format for optional dates, e.g. goal deadlines.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        use super::DATE_FORMAT;

        pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => {
                    let formatted =
                        date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
                    serializer.serialize_some(&formatted)
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Parse a calendar date in the backend's `YYYY-MM-DD` format.
pub fn parse_date(s: &str) -> Result<Date, Error> {
    Date::parse(s, iso_date::DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// An expense or income, i.e. an event where money was either spent or
/// earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction's ID in the backend database.
    pub id: TransactionId,
    /// How much money changed hands.
    pub amount: Amount,
    /// Whether the money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The calendar day the transaction happened on.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Free-form note, if the user entered one.
    #[serde(default)]
    pub description: Option<String>,
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
}

/// The payload for recording a new transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    /// How much money changed hands.
    pub amount: Amount,
    /// Whether the money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The calendar day the transaction happened on.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Free-form note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The category to file the transaction under. Should match `kind`.
    pub category_id: CategoryId,
}

/// A partial update for an existing transaction.
///
/// Only the set fields are sent; the backend keeps the rest as-is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionChanges {
    /// Replacement amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Replacement kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Replacement date.
    #[serde(with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    /// Replacement description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl TransactionChanges {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.kind.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
    }
}

/// Server-side filters for listing transactions.
///
/// The default query matches everything, which is what the list screens use.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// Only transactions on or after this day.
    pub start_date: Option<Date>,
    /// Only transactions on or before this day.
    pub end_date: Option<Date>,
    /// Only transactions filed under this category.
    pub category_id: Option<CategoryId>,
    /// Only transactions of this kind.
    pub kind: Option<TransactionKind>,
}

impl TransactionQuery {
    /// The query string pairs understood by `GET /transactions`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(start_date) = self.start_date {
            if let Ok(formatted) = start_date.format(iso_date::DATE_FORMAT) {
                pairs.push(("start_date", formatted));
            }
        }

        if let Some(end_date) = self.end_date {
            if let Ok(formatted) = end_date.format(iso_date::DATE_FORMAT) {
                pairs.push(("end_date", formatted));
            }
        }

        if let Some(category_id) = self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }

        if let Some(kind) = self.kind {
            pairs.push(("type", kind.as_str().to_owned()));
        }

        pairs
    }
}
