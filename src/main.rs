use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use devserve::config::{Config, SiteRoot};
use devserve::error::StartupError;
use devserve::handler::RequestHandler;
use devserve::logger;
use devserve::server::{self, Shutdown};

/// Serve the directory next to this executable over HTTP, with CORS and no-cache headers
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML); defaults to ./devserve.toml when present
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let cfg = Config::load_from(cli.config.as_deref())?;
    logger::init(&cfg.logging).map_err(StartupError::Logger)?;

    let site = SiteRoot::from_config(&cfg).map_err(StartupError::Root)?;
    let addr = cfg.get_socket_addr().map_err(StartupError::InvalidAddress)?;

    // Create Tokio runtime, worker count from config or CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg, site, addr))
}

async fn async_main(
    cfg: Config,
    site: SiteRoot,
    addr: std::net::SocketAddr,
) -> Result<(), StartupError> {
    let listener =
        server::bind_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;
    let bound = listener.local_addr().unwrap_or(addr);
    logger::log_server_start(&bound, site.path());

    let shutdown = Arc::new(Shutdown::new());
    if let Err(e) = server::signal::start_signal_handler(Arc::clone(&shutdown)) {
        logger::log_warning(&format!("Signal handlers unavailable: {e}"));
    }

    let mut handler = RequestHandler::new(Arc::new(site));
    if cfg.logging.access_log {
        handler = handler.with_access_log(&cfg.logging.access_log_format);
    }

    server::start_server_loop(
        listener,
        handler,
        server::ServerLoopConfig::from(&cfg.performance),
        shutdown.subscribe(),
    )
    .await;
    Ok(())
}
