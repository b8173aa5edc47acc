use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use prompt_pad::config::{DEFAULT_CONFIG_FILE, load_config};
use prompt_pad::logging::{FileSink, NullSink};
use prompt_pad::prompt::{HttpPromptClient, RequestCycle};
use prompt_pad::session::FileSessionStore;
use prompt_pad::{
    AnsiRenderer, CliDriver, CliDriverError, LifecycleLoggerPlugin, Logger, PadApp, PadError,
    PadRuntime, Result, Size,
};

/// Size assumed until the driver reads the real terminal size.
const INITIAL_SIZE: Size = Size::new(100, 32);

#[derive(Parser)]
#[command(version, about = "Three-pane prompt pad for a code-assistant backend")]
struct Cli {
    /// Config file; `prompt_pad.toml` in the working directory by default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding `endpoint.base_url`.
    #[arg(long)]
    endpoint: Option<String>,

    /// File imported into the code pane at start.
    #[arg(long)]
    open: Option<PathBuf>,

    /// JSON-lines log file, overriding `logging.path`.
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = load_config(&config_path)?;
    if let Some(url) = cli.endpoint {
        config.endpoint.base_url = url;
    }
    if let Some(path) = cli.log {
        config.logging.path = Some(path);
    }

    let logger = match &config.logging.path {
        Some(path) => Logger::new(FileSink::new(path, config.logging.max_bytes)?),
        None => Logger::new(NullSink),
    }
    .with_min_level(config.logging.level);

    let jobs = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("pad-jobs")
        .enable_all()
        .build()?;

    let client = HttpPromptClient::new(&config.endpoint)?;
    let cycle = RequestCycle::new(
        client,
        config.submit.mode,
        config.poll.policy(),
        jobs.handle().clone(),
    );
    let session = Arc::new(FileSessionStore::new(config.session.path.clone()));
    let mut app = PadApp::new(config.layout.clone(), INITIAL_SIZE, cycle, session)
        .with_logger(logger.clone());
    if let Some(path) = cli.open {
        app = app.with_initial_file(path);
    }

    let mut runtime = PadRuntime::new(app.layout_tree(), AnsiRenderer::with_default(), INITIAL_SIZE)?;
    runtime.config_mut().logger = Some(logger.clone());
    runtime.config_mut().enable_metrics();
    let app = app.with_metrics(runtime.config_mut().metrics_handle());

    runtime.register_plugin(
        LifecycleLoggerPlugin::new(logger)
            .log_keys(config.logging.log_keys)
            .log_mouse(config.logging.log_mouse),
    );
    runtime.register_plugin(app);

    let result = CliDriver::new(runtime).run().map_err(|err| match err {
        CliDriverError::Runtime(err) => err,
        other => PadError::Backend(other.to_string()),
    });
    jobs.shutdown_timeout(Duration::from_millis(500));
    result
}
