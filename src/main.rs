use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use momo_reconciler::application::ledger::{self, IssueRequest};
use momo_reconciler::application::reconciler::CallbackReconciler;
use momo_reconciler::config::{BIND_ADDR_ENV, DB_PATH_ENV, DEFAULT_BIND_ADDR, Stores};
use momo_reconciler::domain::amount::Amount;
use momo_reconciler::domain::ports::{ClockRef, TransactionStore};
use momo_reconciler::domain::transaction_id::TransactionKind;
use momo_reconciler::infrastructure::clock::SystemClock;
use momo_reconciler::interfaces::csv::transaction_reader::TransactionReader;
use momo_reconciler::interfaces::csv::transaction_writer::TransactionWriter;
use momo_reconciler::interfaces::http::{self, AppState};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Reconciles mobile-money payment callbacks", long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the gateway webhook over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = BIND_ADDR_ENV, default_value = DEFAULT_BIND_ADDR)]
        bind: String,

        /// CSV of pending transactions to load before serving
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Record a new pending payment and print its client transaction id
    Issue {
        /// Coverage product (cnps or cmu)
        #[arg(long)]
        kind: TransactionKind,

        #[arg(long)]
        merchant: String,

        #[arg(long)]
        amount: Amount,

        #[arg(long, default_value = "0")]
        fees: Amount,
    },
    /// Load pending transactions from a CSV file
    Import {
        input: PathBuf,
    },
    /// Write all transactions as CSV to stdout
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let stores = Stores::open(cli.db_path.as_deref()).into_diagnostic()?;
    let clock: ClockRef = Arc::new(SystemClock);

    match cli.command {
        Command::Serve { bind, seed } => {
            if let Some(seed) = seed {
                import_file(&stores, &clock, &seed).await?;
            }
            serve(stores, clock, &bind).await
        }
        Command::Issue {
            kind,
            merchant,
            amount,
            fees,
        } => {
            let request = IssueRequest {
                kind,
                merchant_id: merchant,
                amount,
                fees,
            };
            let tx = ledger::issue_transaction(stores.transactions.as_ref(), clock.as_ref(), request)
                .await
                .into_diagnostic()?;
            println!("{}", tx.client_transaction_id);
            Ok(())
        }
        Command::Import { input } => import_file(&stores, &clock, &input).await,
        Command::Export => {
            let transactions = stores.transactions.all().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = TransactionWriter::new(stdout.lock());
            writer.write_transactions(&transactions).into_diagnostic()?;
            Ok(())
        }
    }
}

async fn import_file(stores: &Stores, clock: &ClockRef, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let reader = TransactionReader::new(file);
    let summary = ledger::import_transactions(stores.transactions.as_ref(), clock.as_ref(), reader.records())
        .await
        .into_diagnostic()?;
    println!("imported {}, skipped {}", summary.imported, summary.skipped);
    Ok(())
}

async fn serve(stores: Stores, clock: ClockRef, bind: &str) -> Result<()> {
    let reconciler = CallbackReconciler::new(stores.transactions, stores.coverage, clock);
    let app = http::router(AppState {
        reconciler: Arc::new(reconciler),
    });

    let listener = tokio::net::TcpListener::bind(bind).await.into_diagnostic()?;
    tracing::info!("listening on {}", bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
