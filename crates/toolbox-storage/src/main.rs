//! toolbox-storage CLI
//!
//! Inspects and edits the toolbox database from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use toolbox_storage::activity::{self, ActivityKind};
use toolbox_storage::ddl;
use toolbox_storage::describe::describe;
use toolbox_storage::prelude::*;
use toolbox_storage::registry;

/// Embedded SQLite storage for the toolbox app.
#[derive(Parser)]
#[command(name = "toolbox-storage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (overrides the config file).
    #[arg(short, long, env = "TOOLBOX_DATABASE_URL")]
    database: Option<String>,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output (every executed statement).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and reconcile every table, printing what was done.
    Sync,

    /// Print the CREATE TABLE statements of the application tables.
    Schema,

    /// User options.
    Options {
        #[command(subcommand)]
        command: OptionsCommand,
    },

    /// Keyboard shortcuts.
    Shortcut {
        #[command(subcommand)]
        command: ShortcutCommand,
    },

    /// Recently used and starred capabilities.
    Activity {
        #[command(subcommand)]
        command: ActivityCommand,
    },

    /// Run a read query and print the rows as JSON.
    Query {
        /// SQL text; `?` placeholders bind ARGS in order.
        sql: String,

        /// Arguments: `null`, integers, floats, anything else is text.
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
enum OptionsCommand {
    /// List options, optionally filtered by group.
    List {
        /// Group label.
        #[arg(short, long)]
        remake: Option<String>,
    },

    /// Set one option.
    Set {
        /// Option key.
        key: String,

        /// Option value.
        value: String,

        /// Owning capability (0 for general settings).
        #[arg(long, default_value_t = 0)]
        capability: i64,

        /// Group label.
        #[arg(short, long, default_value = "general")]
        remake: String,
    },
}

#[derive(Subcommand)]
enum ShortcutCommand {
    /// List shortcuts.
    List,

    /// Assign a key to a capability.
    Assign {
        /// Accelerator, e.g. `Ctrl+Shift+R`.
        key: String,

        /// Capability id.
        capability: i64,
    },
}

#[derive(Subcommand)]
enum ActivityCommand {
    /// Record a use (or a star) of a capability.
    Record {
        /// `recently` or `star`.
        kind: ActivityKind,

        /// Capability id.
        capability: i64,
    },

    /// Remove every entry of a capability.
    Remove {
        /// `recently` or `star`.
        kind: ActivityKind,

        /// Capability id.
        capability: i64,
    },

    /// Show the newest entries, resolved against the built-in catalog.
    Latest {
        /// `recently` or `star`.
        kind: ActivityKind,

        /// Number of entries.
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<StorageConfig> {
    let mut config = match &cli.config {
        Some(path) => StorageConfig::from_json_file(path)?,
        None => StorageConfig::default(),
    };
    if let Some(url) = &cli.database {
        config = config.with_database_url(url);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Schema = cli.command {
        for table in registry::app_tables() {
            println!("{};\n", ddl::create_table_sql(&table));
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let mut storage = Storage::new(config);
    storage.connect().await?;

    match cli.command {
        Commands::Schema => {}

        Commands::Sync => {
            for report in storage.last_sync() {
                println!("{:<10} {}", report.table, report.summary());
                for sql in &report.statements {
                    println!("    {sql}");
                }
                for column in report.skipped() {
                    println!("    skipped column: {column}");
                }
            }
        }

        Commands::Options { command } => match command {
            OptionsCommand::List { remake } => {
                let store = OptionsStore::load(&mut storage).await?;
                let records = match remake {
                    Some(remake) => store.by_remake(&remake),
                    None => store.records().to_vec(),
                };
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
            OptionsCommand::Set {
                key,
                value,
                capability,
                remake,
            } => {
                let mut store = OptionsStore::load(&mut storage).await?;
                let errors = store
                    .save(&mut storage, capability, &remake, [(key.clone(), value)])
                    .await;
                if let Some(first) = errors.into_iter().next() {
                    anyhow::bail!(first);
                }
                info!(key = %key, "Option saved");
            }
        },

        Commands::Shortcut { command } => match command {
            ShortcutCommand::List => {
                let store = ShortcutStore::load(&mut storage).await?;
                println!("{}", serde_json::to_string_pretty(store.records())?);
            }
            ShortcutCommand::Assign { key, capability } => {
                let mut store = ShortcutStore::load(&mut storage).await?;
                store.assign(&mut storage, &key, capability).await?;
                info!(key = %key, capability, "Shortcut assigned");
            }
        },

        Commands::Activity { command } => match command {
            ActivityCommand::Record { kind, capability } => {
                let id = activity::record(&mut storage, kind, capability).await?;
                info!(id, capability, "Recorded {}", kind.table());
            }
            ActivityCommand::Remove { kind, capability } => {
                let removed = activity::remove(&mut storage, kind, capability).await?;
                info!(removed, capability, "Removed from {}", kind.table());
            }
            ActivityCommand::Latest { kind, count } => {
                let ids = activity::latest(&mut storage, kind, count).await?;
                let catalog = Catalog::builtin();
                let capabilities = catalog.resolve_activity(&ids);
                println!("{}", serde_json::to_string_pretty(&capabilities)?);
            }
        },

        Commands::Query { sql, args } => {
            let args = args.iter().map(|a| SqlValue::parse_arg(a)).collect();
            let rows = storage.select_custom(&sql, args).await?;
            println!("{}", describe("", &rows));
        }
    }

    storage.disconnect().await?;
    Ok(())
}
