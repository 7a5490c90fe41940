use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use downtime_backend::application::{
    import_service::ImportService,
    machine_classifier::{MachinePatterns, DEFAULT_GROUP_PATTERN, DEFAULT_MACHINE_PATTERN},
    stats_service::StatsService,
};
use downtime_backend::domain::models::StopFilter;
use downtime_backend::infrastructure::{parsers::FileReaderAdapter, sqlite::SqliteStopRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("downtime_backend=debug".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(file) = args.next() else {
        eprintln!("usage: downtime-backend <file> [--delete-existing]");
        std::process::exit(2);
    };
    let delete_existing = args.any(|arg| arg == "--delete-existing");

    let db_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "production_stops.db".to_string());
    info!("Using database at {}", db_path);

    let machine_pattern = std::env::var("MACHINE_NAME_PATTERN")
        .unwrap_or_else(|_| DEFAULT_MACHINE_PATTERN.to_string());
    let group_pattern = std::env::var("MACHINE_GROUP_PATTERN")
        .unwrap_or_else(|_| DEFAULT_GROUP_PATTERN.to_string());
    let patterns = MachinePatterns::new(&machine_pattern, &group_pattern)?;

    let repo = Arc::new(SqliteStopRepository::new(&db_path)?);
    let reader = Arc::new(FileReaderAdapter::new());
    let service = ImportService::new(reader, repo.clone(), patterns);

    let summary = match service
        .import_file(&PathBuf::from(&file), delete_existing)
        .await
    {
        Ok(summary) => summary,
        Err(e) => {
            error!("Import failed: {}", e);
            return Err(e.into());
        }
    };

    println!(
        "{}",
        serde_json::json!({
            "message": "File imported successfully",
            "processed": summary.processed,
            "skipped": summary.skipped,
        })
    );

    // Post-import overview for the operator.
    let stats = StatsService::new(repo);
    let dashboard = stats.dashboard(&StopFilter::default()).await?;
    info!(
        "Store now holds {:.1} hours of downtime across {} machines",
        dashboard.total_stop_time,
        dashboard.by_machine.len()
    );

    Ok(())
}
