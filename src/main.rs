//! # Policy Desk CLI (`pdesk`)
//!
//! Operator interface for Policy Desk: create the database, seed condition
//! records, inspect and call tools, and run the tool shell an orchestrator
//! talks to.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdesk init` | Create the SQLite database and schema |
//! | `pdesk conditions add` | Register a category → conditions PDF mapping |
//! | `pdesk conditions list` | Show all condition records |
//! | `pdesk status` | Show policy and condition counts |
//! | `pdesk tools list` | Print tool descriptors (function-calling JSON) |
//! | `pdesk tools call <name>` | Invoke one tool and print its JSON result |
//! | `pdesk shell` | Read `<tool> [json]` lines from stdin, one session |
//!
//! ## Examples
//!
//! ```bash
//! pdesk init --config ./config/pdesk.toml
//! pdesk conditions add --category Car --name CarSafe26.1 --reference car_safe_26_1.pdf
//! pdesk tools call resolve_conditions_category --param category=car
//! echo 'get_pdf_info' | pdesk shell
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use policy_desk::config::{self, Config};
use policy_desk::migrate;
use policy_desk::shell::run_shell;
use policy_desk::sqlite_store::SqliteStore;
use policy_desk::tools::{ToolContext, ToolRegistry};
use policy_desk_core::models::PolicyConditionRecord;
use policy_desk_core::policy::store_status;
use policy_desk_core::store::ConditionStore;

/// Policy Desk CLI: conditions lookup, PDF clause search, and a policy
/// book, exposed as tools for an external orchestrator.
#[derive(Parser)]
#[command(
    name = "pdesk",
    about = "Policy Desk — tool-callable insurance conditions search and policy book",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(
        long,
        global = true,
        env = "PDESK_CONFIG",
        default_value = "./config/pdesk.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file with the `policy_conditions` and
    /// `insurances` tables. Idempotent.
    Init,

    /// Manage policy-condition reference records.
    Conditions {
        #[command(subcommand)]
        action: ConditionsAction,
    },

    /// Show database status (policy and condition counts).
    Status,

    /// Inspect and invoke tools.
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },

    /// Run the line-oriented tool shell on stdin/stdout.
    ///
    /// Each input line is `<tool_name> [json-params]`; each output line is
    /// a JSON object. A loaded document stays available until the shell
    /// exits. Type `exit` to quit.
    Shell,
}

#[derive(Subcommand)]
enum ConditionsAction {
    /// Register a category → conditions PDF mapping.
    Add {
        /// Insurance category, e.g. `Car`, `Home`, `Injuries`.
        #[arg(long)]
        category: String,
        /// Conditions edition name, e.g. `CarSafe26.1`.
        #[arg(long)]
        name: String,
        /// PDF path, absolute or relative to `[conditions].root`.
        #[arg(long)]
        reference: String,
    },
    /// List all condition records in lookup order.
    List,
}

#[derive(Subcommand)]
enum ToolsAction {
    /// Print every tool descriptor as OpenAI function-calling JSON.
    List,
    /// Invoke a single tool with a fresh session.
    Call {
        /// Tool name, e.g. `resolve_conditions_category`.
        name: String,
        /// Parameters as a JSON object.
        #[arg(long, conflicts_with = "param")]
        params: Option<String>,
        /// Parameters as `key=value` pairs (values parsed as JSON when possible).
        #[arg(long = "param", value_parser = parse_key_val)]
        param: Vec<(String, String)>,
    },
}

/// Parse a `key=value` pair for `--param` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn build_params(params: Option<String>, pairs: Vec<(String, String)>) -> Result<Value> {
    if let Some(raw) = params {
        return serde_json::from_str(&raw).context("--params is not valid JSON");
    }
    let mut map = Map::new();
    for (key, value) in pairs {
        let parsed = serde_json::from_str(&value).unwrap_or(Value::String(value));
        map.insert(key, parsed);
    }
    Ok(Value::Object(map))
}

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.logging.level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn open_context(cfg: &Config) -> Result<(ToolContext, Arc<SqliteStore>)> {
    let store = Arc::new(SqliteStore::open(cfg).await?);
    let ctx = ToolContext::new(
        Arc::new(cfg.clone()),
        store.clone(),
        store.clone(),
        cfg.chunking_params()?,
    );
    Ok((ctx, store))
}

fn print_descriptors() -> Result<()> {
    let descriptors = ToolRegistry::with_builtins().descriptors();
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Tool descriptors are static; no config needed
    if let Commands::Tools {
        action: ToolsAction::List,
    } = &cli.command
    {
        print_descriptors()?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Conditions { action } => {
            let store = SqliteStore::open(&cfg).await?;
            match action {
                ConditionsAction::Add {
                    category,
                    name,
                    reference,
                } => {
                    let record = PolicyConditionRecord {
                        category,
                        name,
                        storage_reference: reference,
                    };
                    store.insert_condition(&record).await?;
                    if !cfg.resolve_reference(&record.storage_reference).is_file() {
                        tracing::warn!(
                            reference = %record.storage_reference,
                            "conditions PDF does not exist yet"
                        );
                    }
                    println!(
                        "Added conditions {} for category {} ({})",
                        record.name, record.category, record.storage_reference
                    );
                }
                ConditionsAction::List => {
                    let records = store.conditions().await?;
                    if records.is_empty() {
                        println!("No condition records.");
                    } else {
                        println!("{:<16} {:<20} REFERENCE", "CATEGORY", "NAME");
                        for r in &records {
                            println!(
                                "{:<16} {:<20} {}",
                                r.category, r.name, r.storage_reference
                            );
                        }
                    }
                }
            }
            store.close().await;
        }
        Commands::Status => {
            let store = SqliteStore::open(&cfg).await?;
            let status = store_status(&store, &store).await?;
            println!("Policy Desk — Database Status");
            println!("=============================");
            println!("  Database:    {}", cfg.db.path.display());
            println!("  Policies:    {}", status.policy_count);
            println!("  Conditions:  {}", status.condition_count);
            store.close().await;
        }
        Commands::Tools { action } => match action {
            ToolsAction::Call {
                name,
                params,
                param,
            } => {
                let params = build_params(params, param)?;
                let (ctx, store) = open_context(&cfg).await?;
                let registry = ToolRegistry::with_builtins();
                let outcome = registry.invoke(&name, params, &ctx).await;
                store.close().await;
                match outcome {
                    Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                    Err(e) => {
                        println!("{}", serde_json::to_string_pretty(&e.to_json())?);
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
            ToolsAction::List => print_descriptors()?,
        },
        Commands::Shell => {
            let (ctx, store) = open_context(&cfg).await?;
            let registry = ToolRegistry::with_builtins();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            run_shell(&registry, &ctx, stdin, tokio::io::stdout()).await?;
            store.close().await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
