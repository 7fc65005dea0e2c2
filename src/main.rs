use clap::Parser;
use mtl_refresh::config::Command;
use mtl_refresh::utils::error::RefreshError;
use mtl_refresh::utils::{logger, validation::Validate};
use mtl_refresh::{CliConfig, HttpFetcher, RefreshConfig, RefreshEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting mtl-refresh");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    let engine = match RefreshEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => exit_with(e),
    };

    if let Err(e) = run(&cli.command, &config, &engine).await {
        exit_with(e);
    }

    Ok(())
}

async fn run(
    command: &Command,
    config: &RefreshConfig,
    engine: &RefreshEngine<HttpFetcher>,
) -> mtl_refresh::Result<()> {
    match command {
        Command::Download {
            groups,
            no_version,
            dry_run,
        } => {
            let tables = config.select_tables(groups)?;
            let versioned = !no_version;

            if *dry_run {
                tracing::info!("DRY RUN - nothing will be fetched or written");
                let calendar = engine.calendar();
                println!(
                    "Report date: {} ({})",
                    calendar.report_date(),
                    calendar.timezone()
                );
                println!("Target directory: {}", engine.planned_sources_dir(versioned).display());
                for table in &tables {
                    for entry in &table.entries {
                        println!("[{}] {} <- {}", table.name, entry.filename, entry.url);
                    }
                }
                return Ok(());
            }

            let report = engine.download(&tables, versioned).await?;
            println!(
                "Downloaded {} file(s) into {}",
                report.files.len(),
                report.directory.display()
            );
        }
        Command::Backup => {
            let report = engine.backup_processed()?;
            println!(
                "Backed up {} file(s) into {}",
                report.files.len(),
                report.directory.display()
            );
        }
        Command::Latest { date } => {
            println!("{}", engine.latest_sources_dir(*date)?);
        }
        Command::Sources => {
            for table in config.source_tables() {
                println!("{} ({} files)", table.name, table.len());
                for entry in &table.entries {
                    println!("  {} <- {}", entry.filename, entry.url);
                }
            }
        }
    }

    Ok(())
}

fn exit_with(e: RefreshError) -> ! {
    tracing::error!(
        "mtl-refresh failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}
