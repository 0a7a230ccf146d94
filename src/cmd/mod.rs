mod generate;
mod order;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sql-seeder")]
#[command(version)]
#[command(
    about = "Generate relationally consistent test data from CREATE TABLE schemas",
    long_about = None
)]
pub struct Cli {
    /// Log progress details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Schema and relationship options shared by commands that build the graph
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Directory containing *.sql files with CREATE TABLE statements
    #[arg(short, long)]
    pub schema_dir: Option<PathBuf>,

    /// Comma-separated key columns; the table owning all of them is the parent
    #[arg(short, long)]
    pub key_fields: Option<String>,

    /// Comma-separated child_col=parent_col pairs (either side may be table.column)
    #[arg(short, long)]
    pub foreign_map: Option<String>,

    /// Tables to leave out (comma-separated)
    #[arg(short, long)]
    pub exclude: Option<String>,

    /// YAML config file; command-line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Rows to generate for the parent table (default: 10)
    #[arg(short, long, allow_hyphen_values = true)]
    pub num_rows: Option<String>,

    /// Comma-separated Table=N pairs: rows per parent row (default: 1)
    #[arg(short, long, allow_hyphen_values = true)]
    pub multipliers: Option<String>,

    /// Output directory for generated files (default: output)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// SQL dialect for INSERT statements: mysql, postgres, sqlite, mssql
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Random seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability (0.0-1.0) of NULL in nullable non-key columns
    #[arg(long)]
    pub null_rate: Option<f64>,

    /// Upper end of generated dates, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub reference_date: Option<String>,

    /// Write a single dataset.sql / dataset.json instead of per-table files
    #[arg(long)]
    pub combined: bool,

    /// Skip SQL output
    #[arg(long, conflicts_with = "no_json")]
    pub no_sql: bool,

    /// Skip JSON output
    #[arg(long)]
    pub no_json: bool,

    /// Print the generation plan without generating or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Show a progress bar per table
    #[arg(short, long)]
    pub progress: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate INSERT statements and JSON for every table in a schema directory
    Generate(GenerateArgs),

    /// Print the order in which tables are generated (parents first)
    Order {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => generate::run(args),
        Commands::Order { schema } => order::run(schema),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "sql-seeder",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
