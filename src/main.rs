//! influx-export CLI
//!
//! Extract data from InfluxDB into one JSON or CSV file per day (or per hour
//! with `--hourly`), skipping empty windows and never overwriting files.
//!
//! # Configuration
//!
//! Settings are resolved in this order, later wins:
//! - built-in defaults
//! - config file (`--config`, else `~/.config/influx-export/config.toml` or
//!   `./influx-export.toml`)
//! - environment: `INFLUX_EXPORT_HOST`, `INFLUX_EXPORT_PORT`,
//!   `INFLUX_EXPORT_USERNAME`, `INFLUX_EXPORT_PASSWORD`,
//!   `INFLUX_EXPORT_OUTPUT_DIR`, `INFLUX_EXPORT_LOG_LEVEL`,
//!   `INFLUX_EXPORT_LOG_FORMAT`
//! - command line flags
//!
//! `RUST_LOG` overrides the log level when set.

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use influx_export::config::Config;
use influx_export::export::{parse_date, ExportPlan, ExportRunner, ExportSummary, Granularity, OutputFormat};
use influx_export::logging::init_logging;
use influx_export::source::{InfluxClient, InfluxConfig};

#[derive(Parser, Debug)]
#[command(name = "influx-export")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract data from InfluxDB.")]
pub struct Cli {
    /// The name of the InfluxDB database
    #[arg(long)]
    pub database: String,

    /// The name of the measurement to extract data from
    #[arg(long)]
    pub measurement: String,

    /// Start date in YYYY-MM-DD format
    #[arg(long)]
    pub start: String,

    /// End date in YYYY-MM-DD format (inclusive)
    #[arg(long)]
    pub end: String,

    /// Export data in hourly chunks
    #[arg(long)]
    pub hourly: bool,

    /// The InfluxDB host to connect to [default: localhost]
    #[arg(long)]
    pub host: Option<String>,

    /// The InfluxDB port to connect to [default: 8086]
    #[arg(long)]
    pub port: Option<u16>,

    /// The output format of the data
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// Directory the files are written to [default: .]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// InfluxDB username
    #[arg(long)]
    pub username: Option<String>,

    /// InfluxDB password
    #[arg(long)]
    pub password: Option<String>,

    /// Connect over HTTPS
    #[arg(long)]
    pub ssl: bool,

    /// Abort a request after this many seconds; 0 waits indefinitely [default: 0]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Apply explicit flags on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.source.host = host.clone();
        }
        if let Some(port) = self.port {
            config.source.port = port;
        }
        if self.ssl {
            config.source.ssl = true;
        }
        if let Some(username) = &self.username {
            config.source.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.source.password = Some(password.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(secs) = self.timeout {
            config.source.timeout_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (start_date, end_date) = match (parse_date(&cli.start), parse_date(&cli.end)) {
        (Ok(start), Ok(end)) => (start, end),
        _ => {
            eprintln!("Invalid date format. Please use YYYY-MM-DD.");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, start_date, end_date).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, start_date: NaiveDate, end_date: NaiveDate) -> anyhow::Result<ExportSummary> {
    let mut config = Config::resolve(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);

    init_logging(&config.logging);
    tracing::debug!("influx-export v{}", env!("CARGO_PKG_VERSION"));

    let source = &config.source;
    let influx = InfluxConfig::new(&source.host, source.port, source.ssl, cli.database.clone())
        .credentials(source.username.clone(), source.password.clone())
        .timeout_secs(source.timeout_secs)
        .connect_timeout_secs(source.connect_timeout_secs);
    let client = InfluxClient::new(influx).context("failed to create InfluxDB client")?;

    let plan = ExportPlan::new(cli.measurement, start_date, end_date)
        .granularity(Granularity::from_hourly_flag(cli.hourly))
        .format(cli.output_format);

    let mut runner = ExportRunner::new(client, plan, config.output.directory.clone());
    let summary = runner.run().await.context("export failed")?;

    Ok(summary)
}
