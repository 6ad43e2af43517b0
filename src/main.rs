use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use placement_explorer::config::{CollectorConfig, Config, NodeKey};
use placement_explorer::openstack::http::format_api_error;
use placement_explorer::openstack::OpenStackConnector;
use placement_explorer::resource::collect;
use placement_explorer::server::{self, AppState};
use placement_explorer::VERSION;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Visualize available and used resources of an OpenStack cloud
#[derive(Parser, Debug)]
#[command(name = "placement-explorer", version = VERSION, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Cloud from clouds.yaml to query (repeat for several clouds)
    #[arg(short, long = "cloud", env = "OS_CLOUD", value_delimiter = ',', global = true)]
    clouds: Vec<String>,

    /// Serve this recorded snapshot instead of querying the clouds
    #[arg(long, env = "PLACEMENT_EXPLORER_FAKE_DATA", global = true)]
    fake_data: Option<PathBuf>,

    /// clouds.yaml to read instead of the standard locations
    #[arg(long, env = "OS_CLIENT_CONFIG_FILE", global = true)]
    clouds_file: Option<PathBuf>,

    /// Key providers by name (default) or uuid
    #[arg(long, value_enum, global = true)]
    key_by: Option<NodeKey>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect a snapshot, print it and exit non-zero on failure
    Resource,
    /// Serve snapshots over HTTP at /resource
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("placement-explorer {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir
            .join("placement-explorer")
            .join("placement-explorer.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".placement-explorer").join("placement-explorer.log");
    }
    PathBuf::from("placement-explorer.log")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = Config::load();
    let collector_config = CollectorConfig {
        clouds: config.effective_clouds(&args.clouds),
        fake_data: config.effective_fake_data(args.fake_data.clone()),
        node_key: config.effective_node_key(args.key_by),
    };
    let connector = OpenStackConnector::new(config.effective_clouds_file(args.clouds_file.clone()));

    tracing::info!("Using clouds: {:?}", collector_config.clouds);

    match args.command {
        Command::Resource => {
            let result = collect(&collector_config, &connector).await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            if let Some(error) = result.error() {
                if let Some(hint) = format_api_error(error) {
                    eprintln!("{}", hint);
                }
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve { bind } => {
            let addr = config.effective_bind(bind);
            let state = Arc::new(AppState::new(collector_config, Arc::new(connector)));
            server::serve(&addr, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
