use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod data;
mod domain;
mod inputter;
mod list;
mod model;
mod ui;

use controller::Controller;
use data::{Company, CsvSource, Employee, MockSource, RowSource, Ticket};
use domain::{AppConfig, Collection, HrError, Role, Session};
use model::{Model, PageSources, Status};
use ui::TableUi;

/// A tui based HR and payroll records dashboard.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// CSV file backing --collection instead of the built-in demo data
    file: Option<String>,

    /// Which collection the CSV file holds
    #[arg(long, value_enum, default_value = "tickets")]
    collection: Collection,

    /// Role of this session, decides which collections are reachable
    #[arg(long, value_enum, default_value = "super-admin")]
    role: Role,

    /// User name shown in the title bar
    #[arg(long, default_value = "admin")]
    user: String,

    /// Initial rows per page
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Log file (the terminal belongs to the dashboard)
    #[arg(long, default_value = "hrview.log")]
    log_file: String,
}

/// CLI-selected sources: one collection may come from a CSV file, the rest
/// fall back to demo data.
struct CliSources {
    csv: Option<(Collection, CsvSource)>,
}

impl PageSources for CliSources {
    fn tickets(&self) -> &dyn RowSource<Ticket> {
        match &self.csv {
            Some((Collection::Tickets, source)) => source,
            _ => &MockSource,
        }
    }

    fn employees(&self) -> &dyn RowSource<Employee> {
        match &self.csv {
            Some((Collection::Employees, source)) => source,
            _ => &MockSource,
        }
    }

    fn companies(&self) -> &dyn RowSource<Company> {
        match &self.csv {
            Some((Collection::Companies, source)) => source,
            _ => &MockSource,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(log_file: &str) -> Result<(), HrError> {
    let file = std::fs::File::create(log_file)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run() -> Result<(), HrError> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    info!("Starting hrview!");

    let csv = match &args.file {
        Some(raw) => {
            let expanded = shellexpand::full(raw)
                .map_err(|e| HrError::LoadingFailed(format!("bad path {raw}: {e}")))?;
            let path = PathBuf::from(expanded.as_ref());
            Some((args.collection, CsvSource::new(path)?))
        }
        None => None,
    };
    let sources = CliSources { csv };

    let session = Session::new(args.user, args.role);
    let config = AppConfig::default().page_size(args.page_size.max(1));

    let mut model = Model::init(session, config.clone(), &sources)?;
    let ui = TableUi::new(&config);
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}
