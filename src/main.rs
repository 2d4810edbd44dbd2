use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use moneymanager_client::api::{
    CategoryKind, Credentials, FilterQuery, NewCategory, NewTransaction, Registration, SortOrder, search_transactions,
    total_amount,
};
use moneymanager_client::config::parse_storage_location;
use moneymanager_client::{ApiError, ClientConfig, Gateway, GatewayError, MoneyApi, Navigation, Navigator, Route, SessionStore};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

const DEFAULT_LOG_FILTER: &str = "moneymanager_client=info,moneymanager=info";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `moneymanager login` first")]
    NotSignedIn,
    #[error("no view for location `{0}`")]
    UnknownLocation(String),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "moneymanager", about = "Money manager API client")]
struct Cli {
    #[arg(long, env = "MONEY_API_BASE_URL")]
    base_url: Option<String>,

    /// Session file path, or `memory` to keep the session in-process only.
    #[arg(long, env = "MONEY_SESSION_FILE")]
    session_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MONEY_PASSWORD")]
        password: String,
    },
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "MONEY_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami,
    /// Resolve a location through the route guard and print the outcome.
    Open {
        location: String,
    },
    Dashboard,
    /// Delete every income and expense.
    Reset,
    Category(CategoryCommand),
    Income(TransactionCommand),
    Expense(TransactionCommand),
    Filter {
        #[arg(long, default_value = "income")]
        kind: CategoryKind,
        #[arg(long, default_value = "")]
        start_date: String,
        #[arg(long, default_value = "")]
        end_date: String,
        #[arg(long, default_value = "")]
        keyword: String,
        #[arg(long, default_value = "asc")]
        sort: SortOrder,
    },
}

#[derive(Args, Debug)]
struct CategoryCommand {
    #[command(subcommand)]
    command: CategorySubcommand,
}

#[derive(Subcommand, Debug)]
enum CategorySubcommand {
    List,
    ByType {
        kind: CategoryKind,
    },
    Add {
        name: String,
        #[arg(long)]
        kind: CategoryKind,
        #[arg(long, default_value = "")]
        icon: String,
    },
}

#[derive(Args, Debug)]
struct TransactionCommand {
    #[command(subcommand)]
    command: TransactionSubcommand,
}

#[derive(Subcommand, Debug)]
enum TransactionSubcommand {
    /// Current-month entries, optionally narrowed by name or category.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        name: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        category_id: String,
        #[arg(long, default_value = "")]
        icon: String,
    },
}

#[derive(Debug, Clone, Copy)]
enum Ledger {
    Income,
    Expense,
}

struct CliContext {
    api: MoneyApi,
    session: Arc<SessionStore>,
    navigator: Arc<Mutex<Navigator>>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_writer(std::io::stderr)
        .init();

    match run_cli(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(session_file) = &cli.session_file {
        config = config.with_storage(parse_storage_location(session_file));
    }

    let session = Arc::new(SessionStore::open(&config.storage));
    let gateway = Arc::new(Gateway::new(&config, Arc::clone(&session))?);
    let navigator = Arc::new(Mutex::new(Navigator::new(Arc::clone(&session))));
    let follower = tokio::spawn(Navigator::follow_invalidations(Arc::clone(&navigator), gateway.subscribe()));

    let ctx = CliContext { api: MoneyApi::new(gateway), session, navigator };
    let result = run(&ctx, cli.command).await;

    // Closing the event channel lets the follower drain and exit.
    let CliContext { api, navigator, .. } = ctx;
    drop(api);
    if let Err(e) = follower.await {
        tracing::warn!(error = %e, "invalidation follower failed");
    }
    if result.is_err() && navigator.lock().await.session_expired() {
        eprintln!("session expired; run `moneymanager login` to sign in again");
    }
    result
}

async fn run(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => {
            let user = ctx.api.login(&Credentials { email, password }).await?;
            print_json(&user)
        }
        Command::Register { full_name, email, password } => {
            ctx.api.register(&Registration { full_name, email, password }).await?;
            eprintln!("registered; sign in with `moneymanager login`");
            Ok(())
        }
        Command::Logout => {
            ctx.api.logout();
            eprintln!("signed out");
            Ok(())
        }
        Command::Whoami => run_whoami(ctx),
        Command::Open { location } => run_open(ctx, &location).await,
        Command::Dashboard => {
            enter(ctx, Route::Dashboard).await?;
            let dashboard = ctx.api.dashboard().await?;
            print_json(&json!({ "balance": dashboard.balance(), "dashboard": dashboard }))
        }
        Command::Reset => {
            enter(ctx, Route::Dashboard).await?;
            ctx.api.reset_transactions().await?;
            eprintln!("all transactions deleted");
            Ok(())
        }
        Command::Category(category) => run_category(ctx, category).await,
        Command::Income(tx) => run_transactions(ctx, Ledger::Income, tx).await,
        Command::Expense(tx) => run_transactions(ctx, Ledger::Expense, tx).await,
        Command::Filter { kind, start_date, end_date, keyword, sort } => {
            enter(ctx, Route::Filter).await?;
            let query = FilterQuery { kind, start_date, end_date, keyword, sort_order: sort };
            let results = ctx.api.filter(&query).await?;
            print_json(&json!({ "total": total_amount(&results), "transactions": results }))
        }
    }
}

fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let session = ctx.session.snapshot();
    if !session.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let user = session.user.or_else(|| ctx.session.hydrate_user());
    print_json(&json!({ "authenticated": true, "user": user }))
}

async fn run_open(ctx: &CliContext, location: &str) -> Result<(), CliError> {
    let mut navigator = ctx.navigator.lock().await;
    match navigator.navigate(location) {
        Navigation::Rendered { route, hydration } => {
            let user = match hydration {
                Some(handle) => handle.await.ok().flatten(),
                None => ctx.session.user(),
            };
            let history: Vec<&str> = navigator.history().iter().map(|r| r.path()).collect();
            print_json(&json!({ "requested": location, "rendered": route.path(), "history": history, "user": user }))
        }
        Navigation::NotFound { location } => Err(CliError::UnknownLocation(location)),
    }
}

/// Pass `route` through the guard before touching the network.
async fn enter(ctx: &CliContext, route: Route) -> Result<(), CliError> {
    let outcome = ctx.navigator.lock().await.navigate(route.path());
    match outcome {
        Navigation::Rendered { route: rendered, hydration } if rendered == route => {
            if let Some(handle) = hydration {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "user hydration task failed");
                }
            }
            Ok(())
        }
        _ => Err(CliError::NotSignedIn),
    }
}

async fn run_category(ctx: &CliContext, category: CategoryCommand) -> Result<(), CliError> {
    enter(ctx, Route::Category).await?;
    match category.command {
        CategorySubcommand::List => print_json(&ctx.api.categories().await?),
        CategorySubcommand::ByType { kind } => print_json(&ctx.api.categories_by_type(kind).await?),
        CategorySubcommand::Add { name, kind, icon } => {
            let existing = ctx.api.categories().await?;
            let saved = ctx.api.add_category(&NewCategory { name, kind, icon }, &existing).await?;
            print_json(&saved)
        }
    }
}

async fn run_transactions(ctx: &CliContext, ledger: Ledger, tx: TransactionCommand) -> Result<(), CliError> {
    let route = match ledger {
        Ledger::Income => Route::Income,
        Ledger::Expense => Route::Expense,
    };
    enter(ctx, route).await?;

    match tx.command {
        TransactionSubcommand::List { search } => {
            let all = match ledger {
                Ledger::Income => ctx.api.current_month_incomes().await?,
                Ledger::Expense => ctx.api.current_month_expenses().await?,
            };
            let shown = search_transactions(&all, search.as_deref().unwrap_or_default());
            let total: f64 = shown.iter().map(|t| t.amount).sum();
            print_json(&json!({ "total": total, "transactions": shown }))
        }
        TransactionSubcommand::Add { name, amount, date, category_id, icon } => {
            let new = NewTransaction { name, amount, date, icon, category_id };
            let saved = match ledger {
                Ledger::Income => ctx.api.add_income(&new).await?,
                Ledger::Expense => ctx.api.add_expense(&new).await?,
            };
            print_json(&saved)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
