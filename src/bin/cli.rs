//! The command line client for the moneta personal finance tracker.
//!
//! Commands mirror the screens of the web client: the auth flows, one list
//! screen per entity, and the dashboard.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::{Parser, Subcommand};
use numfmt::{Formatter, Precision};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use time::Date;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use moneta::{
    ClientConfig, Error, FileTokenStore, ListPane, Session, SessionPhase,
    api::{ResourceClient, RestClient},
    models::{
        Amount, Budget, BudgetId, Category, CategoryId, Goal, GoalId, Month, NewBudget,
        NewCategory, NewGoal, NewTransaction, NewUser, Transaction, TransactionChanges,
        TransactionId, TransactionKind, TransactionQuery, default_selection, parse_date,
    },
    monthly_evolution, summarize,
};

/// The command line client for the moneta personal finance tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the backend API. Falls back to $MONETA_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for the saved session token. Falls back to
    /// $MONETA_DATA_DIR, then ~/.moneta.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in.
    Register {
        /// Your display name.
        #[arg(long)]
        full_name: String,

        /// The email address to sign in with.
        #[arg(long)]
        email: String,

        /// Agree to the terms and conditions.
        #[arg(long)]
        agree_terms: bool,
    },

    /// Log in and save the session token.
    LogIn {
        /// The email address you registered with.
        #[arg(long)]
        email: String,
    },

    /// Drop the saved session token.
    LogOut,

    /// Show who is currently logged in.
    Whoami,

    /// Request a password reset token.
    ForgotPassword {
        /// The email address you registered with.
        #[arg(long)]
        email: String,
    },

    /// Set a new password using a reset token.
    ResetPassword {
        /// The reset token from the forgot-password step.
        #[arg(long)]
        token: String,
    },

    /// Show totals and the monthly evolution.
    Dashboard,

    /// List, record, edit, and delete transactions.
    Transactions {
        #[command(subcommand)]
        action: TransactionCommand,
    },

    /// List, create, and delete categories.
    Categories {
        #[command(subcommand)]
        action: CategoryCommand,
    },

    /// List, set, and delete monthly budgets.
    Budgets {
        #[command(subcommand)]
        action: BudgetCommand,
    },

    /// List, create, and delete savings goals.
    Goals {
        #[command(subcommand)]
        action: GoalCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// List transactions, newest first, optionally filtered.
    List {
        /// Only transactions on or after this day (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        start_date: Option<Date>,

        /// Only transactions on or before this day (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        end_date: Option<Date>,

        /// Only transactions filed under this category.
        #[arg(long)]
        category: Option<CategoryId>,

        /// Only "income" or only "expense" transactions.
        #[arg(long)]
        kind: Option<TransactionKind>,
    },

    /// Record a transaction.
    Add {
        /// How much money changed hands, e.g. 12.50.
        #[arg(long)]
        amount: Amount,

        /// "income" or "expense".
        #[arg(long)]
        kind: TransactionKind,

        /// The day the transaction happened on (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        date: Date,

        /// A free-form note.
        #[arg(long)]
        description: Option<String>,

        /// The category to file under. Defaults to the first category of
        /// the matching kind.
        #[arg(long)]
        category: Option<CategoryId>,
    },

    /// Change fields of an existing transaction.
    Edit {
        /// The transaction to change.
        id: TransactionId,

        /// Replacement amount.
        #[arg(long)]
        amount: Option<Amount>,

        /// Replacement kind.
        #[arg(long)]
        kind: Option<TransactionKind>,

        /// Replacement date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,

        /// Replacement description.
        #[arg(long)]
        description: Option<String>,

        /// Replacement category.
        #[arg(long)]
        category: Option<CategoryId>,
    },

    /// Delete a transaction.
    Rm {
        /// The transaction to delete.
        id: TransactionId,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// List all categories.
    List,

    /// Create a category.
    Add {
        /// The category name, e.g. "Groceries".
        #[arg(long)]
        name: String,

        /// "income" or "expense".
        #[arg(long)]
        kind: TransactionKind,
    },

    /// Delete a category. Fails while transactions or budgets still use it.
    Rm {
        /// The category to delete.
        id: CategoryId,
    },
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// List all budgets.
    List,

    /// Set a monthly spending limit for an expense category.
    Set {
        /// The expense category the limit applies to. Defaults to the
        /// first expense category.
        #[arg(long)]
        category: Option<CategoryId>,

        /// The spending limit, e.g. 400.
        #[arg(long)]
        amount: Amount,

        /// The month the limit applies to (YYYY-MM).
        #[arg(long)]
        month: Month,
    },

    /// Delete a budget.
    Rm {
        /// The budget to delete.
        id: BudgetId,
    },
}

#[derive(Subcommand, Debug)]
enum GoalCommand {
    /// List all savings goals with their progress.
    List,

    /// Create a savings goal.
    Add {
        /// The goal name, e.g. "Emergency fund".
        #[arg(long)]
        name: String,

        /// The amount to save in total.
        #[arg(long)]
        target: Amount,

        /// The amount already put aside.
        #[arg(long, default_value = "0")]
        current: Decimal,

        /// When to reach the target (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        deadline: Option<Date>,
    },

    /// Delete a goal.
    Rm {
        /// The goal to delete.
        id: GoalId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        ))
        .init();
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = ClientConfig::resolve(cli.api_url, cli.data_dir);
    let client = RestClient::new(&config)?;
    let session = Session::new(client.clone(), FileTokenStore::new(&config.data_dir));

    match cli.command {
        Command::Register {
            full_name,
            email,
            agree_terms,
        } => {
            let password = prompt_new_password()?;
            let new_user = NewUser::new(&full_name, &email, &password, agree_terms)?;

            let user = session.register(&new_user).await?;
            println!("Welcome, {}! You are now logged in.", user.full_name);
        }
        Command::LogIn { email } => {
            let password = prompt_password("Password: ");

            let user = session.log_in(&email, &password).await?;
            println!("Logged in as {} <{}>.", user.full_name, user.email);
        }
        Command::LogOut => {
            session.log_out();
            println!("Logged out.");
        }
        Command::Whoami => match session.bootstrap().await {
            SessionPhase::Authenticated { user, .. } => {
                println!("{} <{}>", user.full_name, user.email);
            }
            _ => println!("Not logged in."),
        },
        Command::ForgotPassword { email } => {
            let reset = session.request_password_reset(&email).await?;

            println!("{}", reset.message);
            if let Some(token) = reset.reset_token {
                println!("Reset token: {token}");
            }
        }
        Command::ResetPassword { token } => {
            let new_password = prompt_new_password()?;

            let message = session.complete_password_reset(&token, &new_password).await?;
            println!("{message}");
        }
        command => {
            authenticate(&session, &client).await?;
            run_authenticated(command, &client).await?;
        }
    }

    Ok(())
}

/// Resolve the saved token and attach it to the client, or fail when no
/// valid session exists.
async fn authenticate(
    session: &Session<RestClient, FileTokenStore>,
    client: &RestClient,
) -> Result<(), Error> {
    match session.bootstrap().await {
        SessionPhase::Authenticated { token, .. } => {
            client.set_bearer(&token);
            Ok(())
        }
        _ => Err(Error::StaleSession),
    }
}

async fn run_authenticated(command: Command, client: &RestClient) -> Result<(), Error> {
    match command {
        Command::Dashboard => show_dashboard(client).await,
        Command::Transactions { action } => run_transactions(action, client).await,
        Command::Categories { action } => run_categories(action, client).await,
        Command::Budgets { action } => run_budgets(action, client).await,
        Command::Goals { action } => run_goals(action, client).await,
        _ => unreachable!("auth commands are handled before authentication"),
    }
}

async fn show_dashboard(client: &RestClient) -> Result<(), Error> {
    let transactions: Vec<Transaction> = ResourceClient::<Transaction>::list(client).await?;

    let summary = summarize(&transactions);
    println!("Total income:  {}", currency(summary.income));
    println!("Total expense: {}", currency(summary.expense));
    println!("Net balance:   {}", currency(summary.balance));

    let evolution = monthly_evolution(&transactions);
    if !evolution.is_empty() {
        println!();
        println!(
            "{:<8} {:>14} {:>14} {:>14}",
            "Month", "Income", "Expense", "Balance"
        );
        for totals in evolution {
            println!(
                "{:<8} {:>14} {:>14} {:>14}",
                totals.month.to_string(),
                currency(totals.income),
                currency(totals.expense),
                currency(totals.balance),
            );
        }
    }

    Ok(())
}

async fn run_transactions(action: TransactionCommand, client: &RestClient) -> Result<(), Error> {
    match action {
        TransactionCommand::List {
            start_date,
            end_date,
            category,
            kind,
        } => {
            let query = TransactionQuery {
                start_date,
                end_date,
                category_id: category,
                kind,
            };
            let transactions = client.transactions_matching(&query).await?;

            if transactions.is_empty() {
                println!("No transactions recorded.");
            }
            for transaction in &transactions {
                println!("{}", transaction_line(transaction));
            }
        }
        TransactionCommand::Add {
            amount,
            kind,
            date,
            description,
            category,
        } => {
            let category_id = match category {
                Some(id) => id,
                None => pick_default_category(client, kind).await?,
            };

            let mut pane: ListPane<Transaction, _> = ListPane::new(client.clone());
            pane.create(&NewTransaction {
                amount,
                kind,
                date,
                description,
                category_id,
            })
            .await;

            outcome(pane.last_error())?;
            println!("Saved. {} transactions on record.", pane.items().len());
        }
        TransactionCommand::Edit {
            id,
            amount,
            kind,
            date,
            description,
            category,
        } => {
            let changes = TransactionChanges {
                amount,
                kind,
                date,
                description,
                category_id: category,
            };
            if changes.is_empty() {
                return Err(Error::Rejected("Nothing to change.".to_owned()));
            }

            let updated = client.update_transaction(id, &changes).await?;
            println!("Updated transaction #{}.", updated.id);
        }
        TransactionCommand::Rm { id } => {
            let mut pane: ListPane<Transaction, _> = ListPane::new(client.clone());
            pane.remove(id).await;

            outcome(pane.last_error())?;
            println!("Deleted. {} transactions on record.", pane.items().len());
        }
    }

    Ok(())
}

async fn run_categories(action: CategoryCommand, client: &RestClient) -> Result<(), Error> {
    match action {
        CategoryCommand::List => {
            let categories: Vec<Category> = ResourceClient::<Category>::list(client).await?;

            if categories.is_empty() {
                println!("No categories yet.");
            }
            for category in &categories {
                println!("#{:<4} {} ({})", category.id, category.name, category.kind);
            }
        }
        CategoryCommand::Add { name, kind } => {
            let name = moneta::models::CategoryName::new(&name)?;

            let mut pane: ListPane<Category, _> = ListPane::new(client.clone());
            pane.create(&NewCategory { name, kind }).await;

            outcome(pane.last_error())?;
            println!("Saved. {} categories on record.", pane.items().len());
        }
        CategoryCommand::Rm { id } => {
            let mut pane: ListPane<Category, _> = ListPane::new(client.clone());
            pane.remove(id).await;

            outcome(pane.last_error())?;
            println!("Deleted. {} categories on record.", pane.items().len());
        }
    }

    Ok(())
}

async fn run_budgets(action: BudgetCommand, client: &RestClient) -> Result<(), Error> {
    match action {
        BudgetCommand::List => {
            let budgets: Vec<Budget> = ResourceClient::<Budget>::list(client).await?;

            if budgets.is_empty() {
                println!("No budgets yet.");
            }
            for budget in &budgets {
                println!(
                    "#{:<4} Category #{} • {} • {}",
                    budget.id,
                    budget.category_id,
                    currency(budget.amount.get()),
                    budget.month,
                );
            }
        }
        BudgetCommand::Set {
            category,
            amount,
            month,
        } => {
            // Budgets only apply to expense categories; the backend rejects
            // the rest.
            let category_id = match category {
                Some(id) => id,
                None => pick_default_category(client, TransactionKind::Expense).await?,
            };

            let mut pane: ListPane<Budget, _> = ListPane::new(client.clone());
            pane.create(&NewBudget {
                category_id,
                amount,
                month,
            })
            .await;

            outcome(pane.last_error())?;
            println!("Saved. {} budgets on record.", pane.items().len());
        }
        BudgetCommand::Rm { id } => {
            let mut pane: ListPane<Budget, _> = ListPane::new(client.clone());
            pane.remove(id).await;

            outcome(pane.last_error())?;
            println!("Deleted. {} budgets on record.", pane.items().len());
        }
    }

    Ok(())
}

async fn run_goals(action: GoalCommand, client: &RestClient) -> Result<(), Error> {
    match action {
        GoalCommand::List => {
            let goals: Vec<Goal> = ResourceClient::<Goal>::list(client).await?;

            if goals.is_empty() {
                println!("No goals yet.");
            }
            for goal in &goals {
                println!("{}", goal_line(goal));
            }
        }
        GoalCommand::Add {
            name,
            target,
            current,
            deadline,
        } => {
            let draft = NewGoal::new(&name, target, current, deadline)?;

            let mut pane: ListPane<Goal, _> = ListPane::new(client.clone());
            pane.create(&draft).await;

            outcome(pane.last_error())?;
            println!("Saved. {} goals on record.", pane.items().len());
        }
        GoalCommand::Rm { id } => {
            let mut pane: ListPane<Goal, _> = ListPane::new(client.clone());
            pane.remove(id).await;

            outcome(pane.last_error())?;
            println!("Deleted. {} goals on record.", pane.items().len());
        }
    }

    Ok(())
}

/// The first category of the matching kind, the same default the web
/// client's category selector used.
async fn pick_default_category(
    client: &RestClient,
    kind: TransactionKind,
) -> Result<CategoryId, Error> {
    let categories: Vec<Category> = ResourceClient::<Category>::list(client).await?;

    default_selection(&categories, kind).ok_or_else(|| {
        Error::Rejected(format!(
            "No {kind} categories exist yet. Create one with `moneta categories add`."
        ))
    })
}

/// Turn a surfaced list-screen failure into a command failure.
fn outcome(last_error: Option<&str>) -> Result<(), Error> {
    match last_error {
        Some(message) => Err(Error::Rejected(message.to_owned())),
        None => Ok(()),
    }
}

fn transaction_line(transaction: &Transaction) -> String {
    let description = transaction.description.as_deref().unwrap_or("-");

    format!(
        "#{:<4} {}  {:<7} {:>12}  {}",
        transaction.id,
        transaction.date,
        transaction.kind,
        currency(transaction.amount.get()),
        description,
    )
}

fn goal_line(goal: &Goal) -> String {
    let deadline = match goal.deadline {
        Some(date) => format!(", due {date}"),
        None => String::new(),
    };

    format!(
        "#{:<4} {}: {} / {} ({}%{})",
        goal.id,
        goal.name,
        currency(goal.current_amount),
        currency(goal.target_amount.get()),
        goal.progress_percent().round(),
        deadline,
    )
}

fn prompt_password(prompt: &str) -> String {
    rpassword::prompt_password(prompt).expect("could not read the password from the terminal")
}

fn prompt_new_password() -> Result<String, Error> {
    let password = prompt_password("Password: ");
    let confirm = prompt_password("Confirm password: ");

    if password != confirm {
        return Err(Error::Rejected("Passwords do not match.".to_owned()));
    }

    Ok(password)
}

fn currency(value: Decimal) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let number = value.to_f64().unwrap_or_default();

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return "$0.00".to_owned();
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}
