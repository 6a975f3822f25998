//! This file defines the dashboard aggregations: pure functions that turn a
//! list of transactions into the figures the dashboard displays.
//!
//! No I/O happens here; callers fetch the transactions and hand them in.
//! All sums are decimal so currency never round-trips through binary
//! floating point.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{Month, Transaction, TransactionKind};

/// Overall income, expense, and net balance for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Sum of all income amounts.
    pub income: Decimal,
    /// Sum of all expense amounts.
    pub expense: Decimal,
    /// `income - expense`.
    pub balance: Decimal,
}

/// Income, expense, and net balance for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyTotals {
    /// The month the figures cover.
    pub month: Month,
    /// Sum of the month's income amounts.
    pub income: Decimal,
    /// Sum of the month's expense amounts.
    pub expense: Decimal,
    /// `income - expense` for the month.
    pub balance: Decimal,
}

/// Total income, expense, and balance across `transactions`.
///
/// An empty list yields all zeros.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut summary = Summary::default();

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => summary.income += transaction.amount.get(),
            TransactionKind::Expense => summary.expense += transaction.amount.get(),
        }
    }

    summary.balance = summary.income - summary.expense;
    summary
}

/// Per-month totals for `transactions`, ascending by month.
///
/// A month appears exactly once if any transaction falls in it, even when
/// only one side has activity. Months with no transactions at all are
/// absent; the caller decides whether gaps need filling for display.
pub fn monthly_evolution(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut buckets: BTreeMap<Month, (Decimal, Decimal)> = BTreeMap::new();

    for transaction in transactions {
        let (income, expense) = buckets.entry(Month::of(transaction.date)).or_default();

        match transaction.kind {
            TransactionKind::Income => *income += transaction.amount.get(),
            TransactionKind::Expense => *expense += transaction.amount.get(),
        }
    }

    buckets
        .into_iter()
        .map(|(month, (income, expense))| MonthlyTotals {
            month,
            income,
            expense,
            balance: income - expense,
        })
        .collect()
}
