use std::process::ExitCode;

use anyhow::Result;
use tasksync::app::App;
use tasksync::config::Config;
use tasksync::logger;
use tasksync::sync::SyncOutcome;
use tasksync::sync_coordinator::CoordinatorError;

const USAGE: &str = "Usage: tasksync [sync|import|export|clear-imports|init-config]";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let command = std::env::args().nth(1).unwrap_or_else(|| "sync".to_string());

    if command == "init-config" {
        let path = Config::get_default_config_path()?;
        Config::generate_default_config(&path)?;
        println!("✅ Configuration written to {}", path.display());
        return Ok(true);
    }

    let config = Config::load()?;
    logger::init(&config.logging)?;
    let app = App::from_config(&config).await?;
    let coordinator = &app.coordinator;

    let result = match command.as_str() {
        "sync" => coordinator.sync_now().await.map(|run| {
            match &run.outcome {
                SyncOutcome::Success(report) => println!(
                    "✅ Sync complete: {} pushed, {} deleted, {} pulled, {} updated",
                    report.push.pushed, report.push.deleted, report.pull.inserted, report.pull.updated
                ),
                SyncOutcome::Failure(failure) => println!("❌ Sync failed ({:?}): {}", failure.kind, failure.message),
            }
            match &run.export {
                Some(Ok(export)) => println!(
                    "📤 Calendar export: {} created, {} updated, {} skipped",
                    export.created, export.updated, export.skipped
                ),
                Some(Err(failure)) => println!("❌ Calendar export failed: {}", failure.message),
                None => {}
            }
            run.outcome.is_success()
        }),
        "import" => coordinator.import_calendar().await.map(|outcome| {
            println!(
                "📅 Imported {} of {} events ({} skipped) into list {}",
                outcome.imported, outcome.total_events, outcome.skipped, outcome.list_id
            );
            true
        }),
        "export" => coordinator.export_to_calendar().await.map(|outcome| {
            println!(
                "📤 Calendar export: {} created, {} updated, {} skipped",
                outcome.created, outcome.updated, outcome.skipped
            );
            true
        }),
        "clear-imports" => coordinator.clear_import_history().await.map(|removed| {
            println!("🧹 Removed {} import mappings", removed);
            true
        }),
        _ => {
            eprintln!("{}", USAGE);
            return Ok(false);
        }
    };

    match result {
        Ok(succeeded) => Ok(succeeded),
        Err(CoordinatorError::Failed(failure)) => {
            println!("❌ {:?}: {}", failure.kind, failure.message);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
