use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use inat_barcode_importer::app::{ImportOptions, Importer, Phase, ProgressSink, RunReport};
use inat_barcode_importer::config::ConfigLoader;
use inat_barcode_importer::error::{ErrorKind, ImportError};
use inat_barcode_importer::http::HttpTransport;
use inat_barcode_importer::inat::InatApi;
use inat_barcode_importer::output::{ConsoleOutput, JsonOutput, OutputMode};
use inat_barcode_importer::store::SqliteStore;

#[derive(Parser)]
#[command(name = "inat-import")]
#[command(about = "Import DNA-barcoded fungal observations from iNaturalist into SQLite")]
#[command(version, author)]
struct Cli {
    /// Resume after this observation id (defaults to 0).
    cursor: Option<u64>,

    #[arg(long)]
    config: Option<String>,

    /// Overrides the database path from the config file.
    #[arg(long)]
    database: Option<Utf8PathBuf>,

    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(report) if report.outcome == Phase::Aborted => ExitCode::from(3),
        Ok(_) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(err) = report.downcast_ref::<ImportError>() {
                return ExitCode::from(map_exit_code(err));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &ImportError) -> u8 {
    match error.kind() {
        ErrorKind::Setup => 2,
        ErrorKind::AuthFailure | ErrorKind::TransportFailure => 3,
        ErrorKind::LookupNotFound | ErrorKind::PersistenceFailure => 1,
    }
}

fn run() -> miette::Result<RunReport> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    if matches!(output_mode, OutputMode::Interactive) {
        ConsoleOutput::print_start();
    }

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    let transport = HttpTransport::new(config.timeout)?;
    let store = SqliteStore::open(&config.database)?;
    let api = InatApi::new(transport, config.endpoints.clone());
    let mut importer = Importer::new(api, store);

    let options = ImportOptions {
        start_cursor: cli.cursor.unwrap_or(0),
        page_delay: config.page_delay,
    };

    let progress: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &ConsoleOutput,
        OutputMode::NonInteractive => &JsonOutput,
    };
    let report = importer.run(&config.credentials, &options, progress);

    match output_mode {
        OutputMode::Interactive => ConsoleOutput::print_report(&report).into_diagnostic()?,
        OutputMode::NonInteractive => JsonOutput::print_report(&report).into_diagnostic()?,
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(map_exit_code(&ImportError::MissingConfig), 2);
        assert_eq!(map_exit_code(&ImportError::Database("locked".into())), 2);
        assert_eq!(map_exit_code(&ImportError::Auth("denied".into())), 3);
        assert_eq!(
            map_exit_code(&ImportError::Status {
                status: 503,
                message: "unavailable".into()
            }),
            3
        );
        assert_eq!(
            map_exit_code(&ImportError::Persistence {
                id: 1,
                message: "disk full".into()
            }),
            1
        );
    }
}
