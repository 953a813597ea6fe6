use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::error;
use log::info;
use log::LevelFilter;
use sheet_sync::config::collect_specs;
use sheet_sync::Credentials;
use sheet_sync::DatabaseTarget;
use sheet_sync::DuckDbStore;
use sheet_sync::GoogleSheetsSource;
use sheet_sync::OnError;
use sheet_sync::SourceRouter;
use sheet_sync::Synchronizer;
use std::path::PathBuf;
use std::process::ExitCode;

/// Copies spreadsheet worksheets into DuckDB tables, replacing each table's contents.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// DuckDB database: a file path, `duckdb://<path>` or `:memory:`.
    #[arg(long, env = "DATABASE_URL", value_name = "TARGET")]
    database: String,

    /// CSV manifest with the header `sheet_id,worksheet_name,table_name`.
    #[arg(long, env = "SHEETS_TO_LOAD_FILE", value_name = "PATH")]
    sheets_file: Option<PathBuf>,

    /// Inline entries: `sheet_id:worksheet_name:table_name[,...]`.
    #[arg(long, env = "SHEETS_TO_LOAD", value_name = "ENTRIES")]
    sheets: Option<String>,

    /// Google service account key (JSON). Wins over `--api-key`.
    #[arg(long, env = "SERVICE_ACCOUNT_FILE", value_name = "PATH")]
    service_account_file: Option<PathBuf>,

    /// Google API key, for spreadsheets shared by link.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the Google Sheets API.
    #[arg(long, env = "SHEETS_API_URL", value_name = "URL")]
    sheets_api_url: Option<String>,

    /// Carry on with the remaining entries after a failure.
    #[arg(long)]
    keep_going: bool,

    /// More log output (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    fn credentials(&self) -> Credentials {
        match (&self.service_account_file, &self.api_key) {
            (Some(path), _) => Credentials::ServiceAccount(path.to_owned()),
            (None, Some(key)) => Credentials::ApiKey(key.to_owned()),
            (None, None) => Credentials::Anonymous,
        }
    }
}

fn main() -> ExitCode {
    // a missing .env file is fine
    dotenvy::dotenv().ok();
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.level())
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            error!("{error:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every entry was synchronized.
fn run(args: &Args) -> Result<bool> {
    let specs = collect_specs(args.sheets_file.as_deref(), args.sheets.as_deref())?;
    let target = DatabaseTarget::parse(&args.database)?;

    let mut google = GoogleSheetsSource::new(args.credentials())?;
    if let Some(api_url) = &args.sheets_api_url {
        google = google.with_api_url(api_url)?;
    }
    let store = DuckDbStore::open(&target).with_context(|| format!("Failed to open database '{target}'"))?;
    info!("Synchronizing {} sheets into '{target}'", specs.len());

    let on_error = if args.keep_going { OnError::Continue } else { OnError::Abort };
    let synchronizer = Synchronizer::new(SourceRouter::new(google), store);
    let report = synchronizer.run(&specs, on_error);

    let (_, store) = synchronizer.into_parts();
    store.close().context("Failed to close database")?;

    for outcome in &report.loaded {
        info!("{}: {} rows", outcome.spec, outcome.rows);
    }
    if !report.is_success() {
        error!("{} of {} sheets failed", report.failed.len(), specs.len());
    }
    Ok(report.is_success())
}
