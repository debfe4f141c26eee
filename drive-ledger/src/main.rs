mod config;
mod jobs;

use std::{path::PathBuf, sync::Arc};

use chrono::{NaiveDate, Utc};
use clap::{Arg, Command};
use config::LedgerConfig;
use drive_api_graphql::GraphQLServer;
use drive_common::{
    error::Error,
    state::{DatabaseTrait, SyncDbTrait},
    sync::yesterday,
};
use drive_persistence::LedgerStateDb;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("drive-ledger")
        .about("Pipeline run ledger: records, audits and syncs ETL pipeline executions")
        .version("0.1.0")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the configuration file")
                .default_value("./drive-ledger.yaml")
                .global(true)
                .action(clap::ArgAction::Set),
        )
        .subcommand(Command::new("migrate").about("Applies database migrations"))
        .subcommand(
            Command::new("serve")
                .about("Starts the GraphQL ledger server")
                .arg(
                    Arg::new("listen_addr")
                        .short('l')
                        .long("listen_addr")
                        .help("Address to listen on, overrides the config file")
                        .action(clap::ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Copies one day of completed runs into the history table")
                .arg(
                    Arg::new("day")
                        .short('d')
                        .long("day")
                        .help("Target day (YYYY-MM-DD), defaults to yesterday (UTC)")
                        .action(clap::ArgAction::Set),
                ),
        )
        .subcommand(Command::new("alerts").about("Prints failing, stuck and anomalous runs as JSON"))
        .subcommand(
            Command::new("reap-stale")
                .about("Resets stale in-process runs for retry")
                .arg(
                    Arg::new("pipeline_name")
                        .short('p')
                        .long("pipeline_name")
                        .help("Only sweep runs of this pipeline, overrides the config file")
                        .action(clap::ArgAction::Set),
                ),
        )
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_target(true)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./drive-ledger.yaml"));

    let mut config = LedgerConfig::load(&config_path)?;

    init_tracing(&config.log_level);

    let db = LedgerStateDb::new(&config.database_url).await?;

    match matches.subcommand() {
        Some(("migrate", _)) => {
            db.migrate().await?;
        }
        Some(("serve", sub_matches)) => {
            config.apply_overrides(None, sub_matches.get_one::<String>("listen_addr").cloned());

            db.migrate().await?;

            let db: Arc<dyn DatabaseTrait> = Arc::new(db);
            let server = GraphQLServer::new(db, config.query_defaults()?, &config.listen_addr)?;

            info!("Starting drive ledger server on {}", config.listen_addr);

            let server_handle = server.serve().await?;

            tokio::select! {
                _ = server_handle => {
                    error!("Server Handle Error");
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C, shutting down server");
                }
            }
        }
        Some(("sync", sub_matches)) => {
            let target_day = match sub_matches.get_one::<String>("day") {
                Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                    Error::InvalidInput(format!("Invalid --day '{day}': {e}"))
                })?,
                None => yesterday(Utc::now()),
            };

            info!(%target_day, "Running sync");

            let outcome = db.run_sync(target_day).await?;
            print_json(&outcome)?;
        }
        Some(("alerts", _)) => {
            let defaults = config.query_defaults()?;
            let report = jobs::collect_alerts(
                &db,
                defaults.stuck_multiplier,
                defaults.volume_factor,
                defaults.default_pipeline_expected_secs,
                Utc::now(),
            )
            .await?;
            print_json(&report)?;
        }
        Some(("reap-stale", sub_matches)) => {
            let defaults = config.query_defaults()?;

            let mut scope = config.stale_filter();
            if let Some(pipeline_name) = sub_matches.get_one::<String>("pipeline_name") {
                scope.pipeline_name = Some(pipeline_name.clone());
            }

            let report = jobs::reap_stale(
                &db,
                &scope,
                defaults.stale_threshold_factor,
                defaults.default_pipeline_expected_secs,
                Utc::now(),
            )
            .await?;
            print_json(&report)?;
        }
        _ => {
            error!("Invalid subcommand");
        }
    }

    Ok(())
}
