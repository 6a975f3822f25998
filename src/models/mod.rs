//! This module defines the domain data types shared by the API boundary and
//! the client logic.
//!
//! All entities are owned by the backend; the client holds transient copies
//! and never assigns identifiers.

pub use budget::{Budget, BudgetId, Month, NewBudget};
pub use category::{Category, CategoryId, CategoryName, NewCategory, default_selection, of_kind};
pub use goal::{Goal, GoalId, NewGoal};
pub use transaction::{
    Amount, NewTransaction, Transaction, TransactionChanges, TransactionId, TransactionKind,
    TransactionQuery, iso_date, parse_date,
};
pub use user::{NewUser, User, UserId};

mod budget;
mod category;
mod goal;
mod transaction;
mod user;
