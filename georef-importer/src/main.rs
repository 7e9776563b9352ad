use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use georef_importer::{Cli, Dependencies, ImportError, Settings};
use georef_importer_pipeline::orchestrator::{ImportReport, Operation};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let Some(operation) = cli.operation() else {
        error!("No operation requested: pass either --init or --update");
        std::process::exit(2);
    };

    match run(&cli, operation).await {
        Ok(report) => {
            info!(
                processed = report.processed,
                emitted = report.emitted,
                skipped = report.skipped,
                failed = report.failed,
                rejected = report.rejected,
                "Import run complete"
            );
            if report.has_failures() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!(error = %e, "Import failed");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli, operation: Operation) -> Result<ImportReport, ImportError> {
    let settings = Settings::from_env()?;
    let dependencies = Dependencies::new(settings)?;

    let mut source = dependencies.source_for(cli.type_doc, cli.source_file.as_deref())?;
    let mut orchestrator = dependencies.orchestrator(cli.type_doc, operation);

    let report = orchestrator.run(source.as_mut()).await?;
    Ok(report)
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
