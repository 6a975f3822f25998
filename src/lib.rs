//! Moneta is a client for a personal-finance tracker REST API: it manages
//! the authenticated session, records income and expense transactions,
//! files them under categories, sets monthly budgets, tracks savings goals,
//! and computes the dashboard aggregates.
//!
//! The pieces fit together like this:
//! - [Session] owns the bearer token and the current [models::User],
//!   keeping both consistent with the durable [token_store] and the
//!   backend.
//! - [api::RestClient] speaks the backend's JSON dialect and turns every
//!   failure into a typed [Error] in one place.
//! - [ListPane] drives the uniform load → submit → reload shape shared by
//!   all list screens.
//! - [dashboard] turns transaction lists into the displayed totals, as
//!   pure functions.

#![warn(missing_docs)]

pub use config::ClientConfig;
pub use dashboard::{MonthlyTotals, Summary, monthly_evolution, summarize};
pub use error::Error;
pub use listing::ListPane;
pub use session::{Session, SessionPhase};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

pub mod api;
mod config;
pub mod dashboard;
mod error;
mod listing;
pub mod models;
mod session;
pub mod token_store;
