use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_tracker::api::{build_router, state::AppState};
use match_tracker::calculate::{compute_dashboard, StatsQuery};
use match_tracker::config::AppConfig;
use match_tracker::ingest::{import_bundle, ExportBundle, ImportBundle};
use match_tracker::models::{RecordId, Role, TicketDraft};
use match_tracker::normalize::{normalize_ticket, validate_ticket};
use match_tracker::storage::RecordStore;

#[derive(Parser)]
#[command(name = "match-tracker")]
#[command(about = "Match results, win rates and team notes for a fixed squad")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,

        /// Log all HTTP requests
        #[arg(long)]
        access_log: bool,

        /// Serve a built frontend from this directory
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Import matches (and improvements) from an export file
    Import {
        /// JSON file: an array of matches or an export bundle
        file: PathBuf,
    },

    /// Write matches and improvements as an export bundle
    Export {
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the dashboard statistics as JSON
    Stats {
        /// Only count matches with a player in this role
        #[arg(long)]
        role: Option<String>,

        /// Only count matches from this season
        #[arg(long)]
        season: Option<String>,
    },

    /// Show the season table
    Seasons,

    /// Add an improvement ticket
    AddTicket {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Write a config file with the default settings
    InitConfig {
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { path } = &cli.command {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        AppConfig::default().write_to(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting match-tracker v{}", env!("CARGO_PKG_VERSION"));

    let seasons = config.season_table()?;
    let mut store = RecordStore::open(config.storage())
        .with_context(|| format!("opening data dir {}", config.data_dir.display()))?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            access_log,
            static_dir,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if static_dir.is_some() {
                config.server.static_dir = static_dir;
            }
            config.validate()?;

            let state = AppState::new(store, &config)?.with_access_log(access_log);
            let app = build_router(state);
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Dashboard: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let bundle = ImportBundle::parse(value)?;
            let report = import_bundle(&mut store, bundle, Utc::now(), &seasons)?;
            println!(
                "Imported {} matches and {} improvements",
                report.imported, report.improvements_imported
            );
        }
        Commands::Export { output } => {
            let bundle = ExportBundle::collect(&store, Utc::now())?;
            let json = serde_json::to_string_pretty(&bundle)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    tracing::info!(
                        "Exported {} matches to {}",
                        bundle.matches.len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
        Commands::Stats { role, season } => {
            let role = role
                .as_deref()
                .map(str::parse::<Role>)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let query = StatsQuery { role, season };
            let matches = store.list_matches()?;
            let dashboard = compute_dashboard(
                &matches,
                &config.stats_settings(),
                &seasons,
                &query,
                Utc::now(),
            );
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Commands::Seasons => {
            let current = seasons.resolve(Utc::now());
            for season in seasons.all() {
                let marker = if season.label == current { "*" } else { " " };
                let end = seasons
                    .end_of(&season.label)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "open".to_string());
                println!("{} {:<12} {} .. {}", marker, season.label, season.start, end);
            }
        }
        Commands::AddTicket { title, description } => {
            let mut draft = TicketDraft::new(RecordId::random(), title);
            draft.description = description;
            validate_ticket(&draft)?;
            let ticket = normalize_ticket(draft, Utc::now());
            store.upsert_ticket(&ticket)?;
            println!("Added ticket {}", ticket.id);
        }
        // Handled before the config is loaded.
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
