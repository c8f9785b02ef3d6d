use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::QueryService;
use crate::config::Config;
use crate::domain::{AccountId, reduce_balance};
use crate::io::{Exporter, ImportOptions, Importer, write_balances_csv, write_balances_json};

/// Bucketbook - account balances from transaction buckets
#[derive(Parser)]
#[command(name = "bucketbook")]
#[command(about = "Query accounts, customers and transaction buckets, and compute per-account balances")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "bucketbook.toml")]
    pub config: PathBuf,

    /// Database file path (overrides the config file)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Import a JSON dataset of accounts, customers and transaction buckets
    Import {
        /// Input file (stdin if omitted)
        input: Option<PathBuf>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },

    /// Export every record as a JSON dataset
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List all accounts
    Accounts,

    /// Show a single account
    Account {
        /// Account id
        account_id: AccountId,
    },

    /// List all customers
    Customers,

    /// Show a single customer with tier details
    Customer {
        /// Customer username
        username: String,
    },

    /// List the transaction buckets of an account
    Buckets {
        /// Account id
        account_id: AccountId,
    },

    /// Net balance of every account listed on a customer
    Balances {
        /// Customer username
        username: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(&self.config)?;
        let config_dir = self
            .config
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        config.database = match &self.database {
            Some(database) => database.clone(),
            None => config.resolve_database(config_dir),
        };
        Ok(config)
    }

    pub async fn run(self) -> Result<()> {
        let config = self.resolve_config()?;
        let database = path_str(&config.database)?;

        tracing::debug!(database, "Resolved configuration");

        let service = match self.command {
            Commands::Init => QueryService::init(database, &config.aggregation).await?,
            _ => QueryService::connect(database, &config.aggregation).await?,
        };
        let result = run_command(&service, database, self.command).await;
        service.close().await;
        result
    }
}

async fn run_command(service: &QueryService, database: &str, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            let stats = service.stats().await?;
            println!("Database initialized: {}", database);
            println!(
                "  {} accounts, {} customers, {} buckets",
                stats.account_count, stats.customer_count, stats.bucket_count
            );
        }

        Commands::Import { input, dry_run } => {
            run_import_command(service, input.as_deref(), dry_run).await?;
        }

        Commands::Export { output } => {
            run_export_command(service, output.as_deref()).await?;
        }

        Commands::Accounts => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<12} {:>10}  {}", "ACCOUNT", "LIMIT", "PRODUCTS");
                println!("{}", "-".repeat(60));
                for account in accounts {
                    println!(
                        "{:<12} {:>10}  {}",
                        account.account_id,
                        account.limit,
                        account.products.join(", ")
                    );
                }
            }
        }

        Commands::Account { account_id } => {
            let account = service.get_account(account_id).await?;
            println!("Account: {}", account.account_id);
            println!("  Limit:    {}", account.limit);
            println!("  Products: {}", account.products.join(", "));
        }

        Commands::Customers => {
            let customers = service.list_customers().await?;
            if customers.is_empty() {
                println!("No customers found.");
            } else {
                println!("{:<20} {:<24} {}", "USERNAME", "NAME", "ACCOUNTS");
                println!("{}", "-".repeat(60));
                for customer in customers {
                    println!(
                        "{:<20} {:<24} {}",
                        truncate(&customer.username, 20),
                        truncate(&customer.name, 24),
                        customer.accounts.len()
                    );
                }
            }
        }

        Commands::Customer { username } => {
            run_customer_command(service, &username).await?;
        }

        Commands::Buckets { account_id } => {
            run_buckets_command(service, account_id).await?;
        }

        Commands::Balances { username, format } => {
            run_balances_command(service, &username, format).await?;
        }
    }

    Ok(())
}

async fn run_customer_command(service: &QueryService, username: &str) -> Result<()> {
    let customer = service.get_customer(username).await?;

    println!("Customer: {}", customer.username);
    println!("  Name:      {}", customer.name);
    println!("  Email:     {}", customer.email);
    println!("  Address:   {}", customer.address.replace('\n', ", "));
    if let Some(birthdate) = customer.birthdate {
        println!("  Birthdate: {}", format_date(birthdate));
    }
    println!(
        "  Accounts:  {}",
        customer
            .accounts
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let tiers = customer.tiers();
    if !tiers.is_empty() {
        println!();
        println!("  {:<10} {:<8} {}", "TIER", "ACTIVE", "BENEFITS");
        for tier in tiers {
            println!(
                "  {:<10} {:<8} {}",
                tier.tier,
                if tier.active { "yes" } else { "no" },
                tier.benefits.join(", ")
            );
        }
    }
    Ok(())
}

async fn run_buckets_command(service: &QueryService, account_id: AccountId) -> Result<()> {
    let buckets = service.transaction_buckets(account_id).await?;
    if buckets.is_empty() {
        println!("No transaction buckets for account {}.", account_id);
        return Ok(());
    }

    for bucket in buckets {
        println!(
            "{} .. {}  ({} transactions, net {})",
            format_date(bucket.bucket_start_date),
            format_date(bucket.bucket_end_date),
            bucket.transaction_count,
            reduce_balance(&bucket.transactions)
        );
        for txn in &bucket.transactions {
            println!(
                "  {}  {:<6} {:<6} {:>8} @ {:>12.4}  {:>14.2}",
                format_date(txn.date),
                txn.transaction_code.as_deref().unwrap_or("-"),
                truncate(&txn.symbol, 6),
                txn.amount
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                txn.price,
                txn.total
            );
        }
    }
    Ok(())
}

async fn run_balances_command(
    service: &QueryService,
    username: &str,
    format: OutputFormat,
) -> Result<()> {
    let balances = service.account_balances(username).await?;

    match format {
        OutputFormat::Json => {
            write_balances_json(&balances, std::io::stdout())?;
            println!();
        }
        OutputFormat::Csv => write_balances_csv(&balances, std::io::stdout())?,
        OutputFormat::Table => {
            if balances.is_empty() {
                println!("No balances for '{}'.", username);
            } else {
                println!("{:<12} {:>14}", "ACCOUNT", "BALANCE");
                println!("{}", "-".repeat(27));
                for entry in &balances {
                    println!("{:<12} {:>14}", entry.account_id, entry.balance);
                }
            }
        }
    }
    Ok(())
}

async fn run_import_command(
    service: &QueryService,
    input: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    use std::fs::File;
    use std::io::{Read, stdin};

    let importer = Importer::new(service);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(std::io::BufReader::new(file))
        }
        None => Box::new(stdin()),
    };

    let result = importer
        .import_json(reader, ImportOptions { dry_run })
        .await?;

    if dry_run {
        println!("Validation successful");
    } else {
        println!("Import complete");
    }
    println!("  Accounts:  {}", result.summary.accounts);
    println!("  Customers: {}", result.summary.customers);
    println!("  Buckets:   {}", result.summary.buckets);

    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in result.warnings.iter().take(10) {
            println!("  {}", warning);
        }
        if result.warnings.len() > 10 {
            println!("  ... and {} more warnings", result.warnings.len() - 10);
        }
    }

    Ok(())
}

async fn run_export_command(service: &QueryService, output: Option<&Path>) -> Result<()> {
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let dataset = exporter.export_dataset_json(writer).await?;
    if output.is_some() {
        eprintln!(
            "Exported {} accounts, {} customers, {} buckets",
            dataset.accounts.len(),
            dataset.customers.len(),
            dataset.transaction_buckets.len()
        );
    }

    Ok(())
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("Database path is not valid UTF-8: {}", path.display()))
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a_very_long_username", 10), "a_very_...");
    }

    #[test]
    fn test_database_flag_overrides_config() {
        let cli = Cli::parse_from([
            "bucketbook",
            "--config",
            "/nonexistent/bucketbook.toml",
            "--database",
            "/tmp/other.db",
            "accounts",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_database_defaults_next_to_config() {
        let cli = Cli::parse_from([
            "bucketbook",
            "--config",
            "/nonexistent/bucketbook.toml",
            "balances",
            "fmiller",
            "--format",
            "json",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.database, PathBuf::from("/nonexistent/bucketbook.db"));
        assert!(matches!(
            cli.command,
            Commands::Balances {
                format: OutputFormat::Json,
                ..
            }
        ));
    }
}
