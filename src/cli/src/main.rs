use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use schemalens::cli::commands::analyze::{AnalyzeCommand, AnalyzeCommandHandler};
use schemalens::cli::commands::catalog::{CatalogCommand, CatalogCommandHandler};
use schemalens::cli::commands::details::{DetailsCommand, DetailsCommandHandler};
use schemalens::cli::{Cli, Commands};
use schemalens::core::naming::LOG_ENV;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// トレーシングを初期化する
///
/// `SCHEMALENS_LOG` が優先され、未指定なら warn（`--verbose` 時は debug）。
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Catalog { env } => {
            let handler = CatalogCommandHandler::new();
            let command = CatalogCommand {
                project_path,
                config_path,
                env,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Details { name, kind, env } => {
            let handler = DetailsCommandHandler::new();
            let command = DetailsCommand {
                project_path,
                config_path,
                env,
                name,
                kind,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Analyze {
            name,
            kind,
            script,
            engine,
            env,
        } => {
            let handler = AnalyzeCommandHandler::new();
            let command = AnalyzeCommand {
                project_path,
                config_path,
                env,
                name,
                kind,
                script,
                engine,
                format: cli.format,
            };
            handler.execute(&command).await
        }
    }
}
