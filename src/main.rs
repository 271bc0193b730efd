// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use sight_map::config::{Cli, Command};
use sight_map::{logging, source_for, FetchError, Record, SelectionSyncController};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command() {
        Command::View => run_view(&cli),
        Command::Dump { page } => run_dump(&cli, page),
    }
}

fn controller_for(cli: &Cli) -> SelectionSyncController {
    let mut controller = SelectionSyncController::new(cli.page_size);
    if let Some(category) = &cli.category {
        controller.set_filter(Some(category.clone()));
    }
    controller
}

fn run_dump(cli: &Cli, page: usize) -> Result<ExitCode> {
    logging::init_stderr();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let source = source_for(&cli.endpoint, cli.fetch_timeout())?;

    println!("📍 Fetching records from {}", source.describe());
    let result = runtime.block_on(source.fetch_all());

    match dump_page(controller_for(cli), result, page) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(message) => {
            println!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Lines printed for one page, or the `Error: ..` line when the fetch failed
fn dump_page(
    mut controller: SelectionSyncController,
    result: Result<Vec<Record>, FetchError>,
    page: usize,
) -> Result<Vec<String>, String> {
    match result {
        Ok(records) => controller.on_fetch_complete(records),
        Err(error) => {
            let message = format!("Error: {}", error);
            controller.on_fetch_failed(error);
            return Err(message);
        }
    }
    controller.set_page(page);

    let mut lines = vec![
        format!(
            "✓ Loaded {} records, {} visible{}",
            controller.records().len(),
            controller.visible_records().count(),
            controller
                .filter()
                .map(|c| format!(" in \"{}\"", c))
                .unwrap_or_default()
        ),
        format!("\nPage {}/{}", controller.page(), controller.page_count()),
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".to_string(),
    ];

    lines.extend(controller.page_records().iter().map(|record| {
        format!(
            "{:>5}  {:<30}  {:<30}  {}",
            record.id,
            record.name,
            record.address,
            record.position()
        )
    }));

    Ok(lines)
}

#[cfg(feature = "tui")]
fn run_view(cli: &Cli) -> Result<ExitCode> {
    use sight_map::map::TerminalMap;
    use sight_map::{locate, GeoOptions, LocationProvider};
    use std::sync::{mpsc, Arc};
    use ui::AppEvent;

    if let Some(path) = &cli.log_file {
        logging::init_file(path)?;
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let (tx, rx) = mpsc::channel();

    // One fetch per session
    let source = source_for(&cli.endpoint, cli.fetch_timeout())?;
    let source_name = source.describe();
    tracing::info!(source = %source_name, "starting viewer");
    {
        let tx = tx.clone();
        runtime.spawn(async move {
            let result = source.fetch_all().await;
            let _ = tx.send(AppEvent::Fetched(result));
        });
    }

    // One location request, fired by the UI after the first gesture
    let provider: Arc<dyn LocationProvider> = Arc::from(cli.location_provider());
    let handle = runtime.handle().clone();
    let request_location = move || {
        let provider = Arc::clone(&provider);
        let tx = tx.clone();
        handle.spawn(async move {
            let result = locate(provider.as_ref(), &GeoOptions::default()).await;
            let _ = tx.send(AppEvent::Located(result));
        });
    };

    let map = TerminalMap::new(sight_map::map::DEFAULT_CENTER, cli.zoom);
    let mut app = ui::App::new(controller_for(cli), map, source_name);
    ui::run_ui(&mut app, &rx, request_location)?;

    runtime.shutdown_background();
    tracing::info!("viewer closed");

    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "tui"))]
fn run_view(_cli: &Cli) -> Result<ExitCode> {
    eprintln!("❌ Viewer not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a page with: sight-map dump");
    Ok(ExitCode::FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(count: i64) -> Vec<Record> {
        (1..=count)
            .map(|id| Record {
                id,
                name: format!("Sight {}", id),
                address: format!("Street {}", id),
                latitude: 47.2,
                longitude: 38.9 + id as f64 / 1000.0,
                category: Some(if id % 2 == 0 { "Парки" } else { "Музеи" }.to_string()),
                description: None,
                percent: None,
                bat_level: None,
                time_at: None,
            })
            .collect()
    }

    #[test]
    fn test_dump_fetch_error_is_reported() {
        let err = dump_page(
            SelectionSyncController::new(7),
            Err(FetchError::Status(500)),
            1,
        )
        .unwrap_err();
        assert_eq!(err, "Error: Request failed with status code 500");
    }

    #[test]
    fn test_dump_prints_requested_page() {
        let lines = dump_page(SelectionSyncController::new(7), Ok(records(15)), 3).unwrap();

        assert_eq!(lines[0], "✓ Loaded 15 records, 15 visible");
        assert_eq!(lines[1], "\nPage 3/3");
        assert_eq!(lines.len(), 3 + 1);
        assert!(lines[3].contains("Sight 15"));
        assert!(lines[3].ends_with(&records(15)[14].position().to_string()));
    }

    #[test]
    fn test_dump_applies_category_from_cli() {
        let cli = Cli::try_parse_from(["sight-map", "--category", "Музеи", "dump"]).unwrap();
        let lines = dump_page(controller_for(&cli), Ok(records(15)), 1).unwrap();

        assert_eq!(lines[0], "✓ Loaded 15 records, 8 visible in \"Музеи\"");
        assert_eq!(lines[1], "\nPage 1/2");
        assert_eq!(lines.len(), 3 + 7);
    }
}
