// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use econ_dashboard::config::{Config, Mode};
use econ_dashboard::dashboard::Dashboard;
use econ_dashboard::presentation::{country_label, format_number};
use econ_dashboard::selection::Pick;
use econ_dashboard::source::load_all;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (mode, config) = Config::from_args(&args, |key| env::var(key).ok())?;

    init_logging(&config)?;
    tracing::info!("starting in {:?} mode, source {}", mode, config.source().describe());

    let runtime = Runtime::new().context("Failed to start async runtime")?;

    match mode {
        Mode::Report => run_report(&runtime, &config)?,
        Mode::Dashboard => run_ui_mode(&runtime, &config)?,
    }

    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file
fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file: {:?}", config.log_file))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn run_report(runtime: &Runtime, config: &Config) -> Result<()> {
    let source = config.source();

    println!("📊 Economic Indicators Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\n📡 Loading from {}...", source.describe());

    let (countries, records) = runtime.block_on(load_all(source.as_ref()));

    let mut dashboard = Dashboard::new();
    dashboard.apply_countries(countries);
    dashboard.apply_records(records);

    for failure in dashboard.fetch_failures() {
        eprintln!("❌ {}", failure.message);
    }

    println!(
        "✓ Loaded {} countries, {} records",
        dashboard.dataset.countries.len(),
        dashboard.dataset.records.len()
    );

    dashboard.toggle_country_selection(vec![Pick::SelectAll]);
    dashboard.toggle_year_selection(vec![Pick::SelectAll]);

    println!("\n{:<6} {:<24} {:>18} {:>22}", "Year", "Country", "External Debt", "Education Expenditure");
    for row in dashboard.filtered_rows() {
        println!(
            "{:<6} {:<24} {:>18} {:>22}",
            row.year,
            country_label(&dashboard.dataset, row.country),
            format_number(row.external_debt),
            format_number(row.education_expenditure)
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Totals across all years");
    for totals in dashboard.aggregate_by_country() {
        println!(
            "{:<31} {:>18} {:>22}",
            country_label(&dashboard.dataset, totals.country),
            format_number(totals.external_debt),
            format_number(totals.education_expenditure)
        );
    }

    if !dashboard.fetch_failures().is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(runtime: &Runtime, config: &Config) -> Result<()> {
    use econ_dashboard::source::spawn_load;
    use tokio::sync::mpsc;

    let source = config.source();
    let label = source.describe();

    // Fetches run on the runtime's workers while the UI loop owns this thread
    let _guard = runtime.enter();
    let (tx, rx) = mpsc::unbounded_channel();
    // Detached: the tasks end on their own once both fetches settle
    let _ = spawn_load(source, tx);

    let mut app = ui::App::new(rx, label);
    ui::run_ui(&mut app)?;

    tracing::info!("dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_runtime: &Runtime, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a report: econ-dashboard report");
    std::process::exit(1);
}
