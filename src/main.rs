use clap::{Parser, Subcommand};
use ipay::application::router::{PaymentRouter, Services};
use ipay::domain::gateway::PaymentRequest;
use ipay::domain::port::PortId;
use ipay::domain::ports::{ConfigProviderRef, TransactionStoreRef};
use ipay::domain::request::VerifyRequest;
use ipay::domain::transaction::{Amount, TransactionId};
use ipay::error::PaymentError;
use ipay::infrastructure::config::{JsonConfig, Settings};
use ipay::infrastructure::in_memory::InMemoryTransactionStore;
#[cfg(feature = "storage-rocksdb")]
use ipay::infrastructure::rocksdb::RocksDBStore;
use ipay::infrastructure::sandbox::{SandboxBank, SandboxPolicy};
use ipay::interfaces::json::writer::JsonWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (timezone, per-port credentials)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Make the sandbox bank decline every confirmation
    #[arg(long, global = true)]
    decline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported ports
    Ports,
    /// Open a payment and print where to redirect the payer
    Initiate {
        /// Port name or numeric id
        port: PortId,
        amount: Decimal,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
    },
    /// Verify a gateway callback, given its query string
    Verify { query: String },
    /// Print a stored transaction
    Show { id: TransactionId },
}

fn open_store(db_path: Option<PathBuf>) -> Result<TransactionStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
        None => Ok(Arc::new(InMemoryTransactionStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = JsonConfig::load(cli.config.as_deref()).into_diagnostic()?;
    // Timezone is process-wide presentation state, settled once here.
    let timezone = Settings::new(&config).timezone().into_diagnostic()?;
    let config: ConfigProviderRef = Arc::new(config);

    let store = open_store(cli.db_path)?;
    let policy = if cli.decline {
        SandboxPolicy::Decline
    } else {
        SandboxPolicy::Approve
    };
    let services = Services::new(config, store.clone(), Arc::new(SandboxBank::new(policy)));

    let stdout = io::stdout();
    let mut writer = JsonWriter::new(stdout.lock()).with_timezone(timezone);

    match cli.command {
        Command::Ports => {
            let router = PaymentRouter::new(services, None).into_diagnostic()?;
            writer.write_ports(&router.supported_ports()).into_diagnostic()?;
        }
        Command::Initiate {
            port,
            amount,
            description,
            mobile,
        } => {
            let router = PaymentRouter::new(services, Some(port)).into_diagnostic()?;
            let request = PaymentRequest {
                amount: Amount::new(amount).into_diagnostic()?,
                description,
                mobile,
            };
            let redirect = router.initiate(request).await.into_diagnostic()?;
            writer.write(&redirect).into_diagnostic()?;
        }
        Command::Verify { query } => {
            let mut router = PaymentRouter::new(services, None).into_diagnostic()?;
            let outcome = router
                .verify(&VerifyRequest::from_query(&query))
                .await
                .into_diagnostic()?;
            writer.write(&outcome).into_diagnostic()?;
        }
        Command::Show { id } => {
            let transaction = store
                .find(id)
                .await
                .into_diagnostic()?
                .ok_or(PaymentError::NotFoundTransaction(id))
                .into_diagnostic()?;
            writer.write_transaction(&transaction).into_diagnostic()?;
        }
    }

    Ok(())
}
