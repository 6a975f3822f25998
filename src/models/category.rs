//! This file defines the `Category` type and the types needed to create one.
//! A category acts like a label for transactions and budgets; every
//! transaction is filed under exactly one category of the matching kind.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, models::TransactionKind};

/// A newtype wrapper for integer category IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(i64);

impl CategoryId {
    /// Create a category ID from its integer form.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The integer form of the ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CategoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            Err(Error::EmptyName("category name"))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for expenses and income, e.g. 'Groceries', 'Eating Out',
/// 'Wages'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The category's ID in the backend database.
    pub id: CategoryId,
    /// The display name.
    pub name: CategoryName,
    /// Which kind of transaction the category applies to.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// The payload for creating a category.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Which kind of transaction the category applies to.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// The categories applicable to transactions of `kind`, in backend order.
///
/// Category-dependent forms show only these choices, which is the sole
/// client-side guard keeping a transaction's kind aligned with its
/// category's.
pub fn of_kind(categories: &[Category], kind: TransactionKind) -> Vec<&Category> {
    categories
        .iter()
        .filter(|category| category.kind == kind)
        .collect()
}

/// The category a form should preselect after its kind changed: the first
/// category of the matching kind, if any exists.
pub fn default_selection(categories: &[Category], kind: TransactionKind) -> Option<CategoryId> {
    categories
        .iter()
        .find(|category| category.kind == kind)
        .map(|category| category.id)
}


#[cfg(test)]
mod filter_tests {
    use crate::models::TransactionKind;

    use super::{Category, CategoryId, CategoryName, default_selection, of_kind};

    fn sample_categories() -> Vec<Category> {
        vec![
            Category {
                id: CategoryId::new(1),
                name: CategoryName::new_unchecked("Wages"),
                kind: TransactionKind::Income,
            },
            Category {
                id: CategoryId::new(2),
                name: CategoryName::new_unchecked("Groceries"),
                kind: TransactionKind::Expense,
            },
            Category {
                id: CategoryId::new(3),
                name: CategoryName::new_unchecked("Rent"),
                kind: TransactionKind::Expense,
            },
        ]
    }

    #[test]
    fn of_kind_keeps_only_matching_categories() {
        let categories = sample_categories();

        let expenses = of_kind(&categories, TransactionKind::Expense);

        let names: Vec<&str> = expenses
            .iter()
            .map(|category| category.name.as_ref())
            .collect();
        assert_eq!(names, vec!["Groceries", "Rent"]);
    }

    #[test]
    fn default_selection_is_the_first_match() {
        let categories = sample_categories();

        let selected = default_selection(&categories, TransactionKind::Expense);

        assert_eq!(selected, Some(CategoryId::new(2)));
    }

    #[test]
    fn default_selection_is_none_when_nothing_matches() {
        let categories: Vec<Category> = sample_categories()
            .into_iter()
            .filter(|category| category.kind == TransactionKind::Expense)
            .collect();

        let selected = default_selection(&categories, TransactionKind::Income);

        assert_eq!(selected, None);
    }
}
