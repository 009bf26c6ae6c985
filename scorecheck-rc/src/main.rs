//! Results Checker (scorecheck-rc) - Main entry point
//!
//! Thin CLI over the library: full screenshot checks, offline
//! reconciliation of saved documents, tie-break inspection and history
//! import. Every command prints JSON to stdout; a failed command exits 1.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorecheck_common::config::{
    load_module_config, resolve_vision_api_key, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use scorecheck_common::db::{import_match_rankings, init_database, MatchRankingRecord};
use scorecheck_rc::authority::{load_authority_file, AuthoritySource, HttpAuthorityClient, StaticAuthority};
use scorecheck_rc::{GameResult, OpenAiVisionClient, Reconciler, ResultsChecker, SqliteTieBreakStore, TieBreakProvider};

const MODULE_NAME: &str = "results-checker";

/// Command-line arguments for scorecheck-rc
#[derive(Parser, Debug)]
#[command(name = "scorecheck-rc")]
#[command(about = "Checks match results screenshots against the authoritative ranking")]
#[command(version)]
struct Args {
    /// Bootstrap TOML config (default: <config_dir>/scorecheck/results-checker.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder holding the database and images
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a game's screenshots and diff them against the authority
    Check {
        #[arg(long)]
        game_id: String,

        #[arg(long)]
        stage: i64,

        /// Directory holding `{game_id}_rank_{n}` images
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Saved authority list used instead of the configured URL
        #[arg(long)]
        authority: Option<PathBuf>,
    },

    /// Reconcile an already-extracted result document
    Reconcile {
        #[arg(long)]
        game_result: PathBuf,

        #[arg(long)]
        authority: PathBuf,

        #[arg(long)]
        stage: i64,
    },

    /// Print a team's tie-break stats for a stage
    Stats {
        #[arg(long)]
        team: String,

        #[arg(long)]
        stage: i64,
    },

    /// Upsert a JSON array of match ranking records into the history store
    ImportHistory { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref(), std::io::stderr)?;

    init_tracing(&config)?;

    info!(
        "Starting Results Checker (scorecheck-rc) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // anyhow reports the error chain on exit
    run(args, config).await
}

/// Load the TOML config with a temporary subscriber in place
///
/// The configured subscriber depends on the config itself, so warnings
/// raised while loading it go to `writer` at `RUST_LOG` or `warn` level.
fn load_config<W>(explicit: Option<&Path>, writer: W) -> Result<TomlConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .finish();

    let config = tracing::subscriber::with_default(bootstrap, || load_module_config(MODULE_NAME, explicit))?;
    Ok(config)
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            // stdout carries command output
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn run(args: Args, config: TomlConfig) -> Result<()> {
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_config(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    info!("Root folder: {}", initializer.root_folder().display());

    match args.command {
        Command::Check {
            game_id,
            stage,
            images_dir,
            authority,
        } => {
            let pool = open_store(&initializer).await?;
            let images_dir = images_dir
                .or_else(|| config.images_dir.clone())
                .unwrap_or_else(|| initializer.images_dir());

            let api_key = resolve_vision_api_key(&config)?;
            let extractor = OpenAiVisionClient::new(
                config.extractor.base_url.clone(),
                config.extractor.model.clone(),
                api_key,
                config.extractor.timeout(),
            )?;

            let authority: Arc<dyn AuthoritySource> = match authority {
                Some(path) => Arc::new(StaticAuthority::new(load_authority_file(&path)?)),
                None => {
                    let url = config
                        .authority
                        .url
                        .clone()
                        .context("No authority URL configured; set [authority] url or pass --authority")?;
                    Arc::new(HttpAuthorityClient::new(url, config.authority.timeout())?)
                }
            };

            let checker = ResultsChecker::new(
                Arc::new(extractor),
                authority,
                reconciler(pool, &config),
                images_dir,
            );
            let errors = checker.check(&game_id, stage).await?;
            print_json(&json!({ "error_list": errors }))
        }

        Command::Reconcile {
            game_result,
            authority,
            stage,
        } => {
            let mut game = read_game_result(&game_result)?;
            let records = load_authority_file(&authority)?;
            let pool = open_store(&initializer).await?;

            let errors = reconciler(pool, &config).reconcile(&mut game, stage, &records).await?;
            print_json(&json!({ "game_result": game, "error_list": errors }))
        }

        Command::Stats { team, stage } => {
            let pool = open_store(&initializer).await?;
            let provider = TieBreakProvider::new(Arc::new(SqliteTieBreakStore::new(pool)), config.tiebreak.timeout());

            let stats = provider.get_tiebreak_stats(&team, stage).await?;
            print_json(&json!({ "team_name": team, "stage": stage, "tiebreak_stats": stats }))
        }

        Command::ImportHistory { file } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let records: Vec<MatchRankingRecord> =
                serde_json::from_str(&body).context("History file must be a JSON array of match records")?;

            let pool = open_store(&initializer).await?;
            let imported = import_match_rankings(&pool, &records).await?;
            info!(imported, "History import complete");
            print_json(&json!({ "imported": imported }))
        }
    }
}

async fn open_store(initializer: &RootFolderInitializer) -> Result<SqlitePool> {
    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    Ok(pool)
}

fn reconciler(pool: SqlitePool, config: &TomlConfig) -> Reconciler {
    Reconciler::new(TieBreakProvider::new(
        Arc::new(SqliteTieBreakStore::new(pool)),
        config.tiebreak.timeout(),
    ))
}

fn read_game_result(path: &Path) -> Result<GameResult> {
    let body = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let game: GameResult = serde_json::from_str(&body).context("Not a game result document")?;
    game.validate()?;
    Ok(game)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
