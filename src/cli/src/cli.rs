// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use crate::core::config::Engine;
use crate::core::object::ObjectKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Schemalens - Database Object Lineage CLI
///
/// Reads catalog metadata from PostgreSQL, MySQL and SQL Server,
/// resolves table dependencies and merges them with an inferred analysis.
#[derive(Parser, Debug)]
#[command(name = "schemalens")]
#[command(author = "Schemalens Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Database object lineage CLI tool")]
#[command(long_about = "Schemalens - Database Object Lineage CLI

Introspects database objects and reports which tables and columns they touch.

Schemalens helps you:
  • Browse the tables, views, routines and triggers of a database
  • Inspect the definition and resolved table dependencies of an object
  • Produce a lineage report combining catalog facts with an inferred summary

Supported databases: PostgreSQL, MySQL, SQL Server")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Describe your connection in .schemalens.yaml
  2. List objects:                  schemalens catalog
  3. Inspect an object:             schemalens details orders_view --type VIEW
  4. Produce a lineage report:      schemalens analyze orders_view --type VIEW

For detailed help on each command, use: schemalens <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tables, views, routines and triggers
    ///
    /// EXAMPLES:
    ///   # List objects of the development database
    ///   schemalens catalog
    ///
    ///   # List objects as JSON
    ///   schemalens catalog --env production --format json
    Catalog {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },

    /// Show the definition and catalog dependencies of an object
    ///
    /// Tables report their real columns; other objects report the tables
    /// their definition references, with the columns it mentions.
    ///
    /// EXAMPLES:
    ///   schemalens details orders --type TABLE
    ///   schemalens details sp_process_sale --type PROCEDURE
    Details {
        /// Object name
        #[arg(value_name = "NAME")]
        name: String,

        /// Object kind (TABLE, VIEW, PROCEDURE, FUNCTION, TRIGGER)
        #[arg(short = 't', long = "type", value_name = "KIND")]
        kind: ObjectKind,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },

    /// Produce a lineage report for an object or a SQL script
    ///
    /// Without --script the definition is read from the database and the
    /// inferred analysis is reconciled with the catalog. With --script the
    /// file is analyzed as-is and no database connection is made.
    ///
    /// EXAMPLES:
    ///   # Analyze a view of the development database
    ///   schemalens analyze v_sales_summary --type VIEW
    ///
    ///   # Analyze a script file
    ///   schemalens analyze --type PROCEDURE --script ./sp_process_sale.sql --engine mysql
    Analyze {
        /// Object name (defaults to "Script" with --script)
        #[arg(value_name = "NAME", required_unless_present = "script")]
        name: Option<String>,

        /// Object kind (TABLE, VIEW, PROCEDURE, FUNCTION, TRIGGER)
        #[arg(short = 't', long = "type", value_name = "KIND")]
        kind: ObjectKind,

        /// Analyze this SQL file instead of a database object
        #[arg(short, long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// SQL dialect hint for --script (postgresql, mysql, sqlserver)
        #[arg(long, value_name = "ENGINE", requires = "script")]
        engine: Option<Engine>,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },
}
