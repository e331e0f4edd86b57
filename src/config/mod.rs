// Configuration module entry point
// Loads start-up configuration and resolves the immutable site root

mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use state::SiteRoot;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Port used when neither the config file nor the environment sets one
pub const DEFAULT_PORT: u16 = 3001;

/// Default config file name (without extension), looked up in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "devserve";

/// Environment variable prefix, e.g. `DEVSERVE_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "DEVSERVE";

pub(crate) fn default_server_name() -> String {
    format!("devserve/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from an explicit file, or the optional `devserve.toml`
    /// in the working directory, layered under `DEVSERVE_*` environment variables.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let file = match config_path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default("logging.access_log_format", defaults.logging.access_log_format)?
            .set_default("performance.keep_alive", defaults.performance.keep_alive)?
            .set_default(
                "performance.connection_timeout",
                to_config_int(defaults.performance.connection_timeout),
            )?
            .set_default(
                "performance.shutdown_timeout",
                to_config_int(defaults.performance.shutdown_timeout),
            )?
            .set_default("http.server_name", defaults.http.server_name)?
            .set_default("http.index_files", defaults.http.index_files)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Directory to serve: the configured root, or the directory holding the executable
    pub fn root_dir(&self) -> std::io::Result<PathBuf> {
        if let Some(root) = &self.server.root {
            return Ok(root.clone());
        }
        let exe = std::env::current_exe()?;
        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("executable {} has no parent directory", exe.display()),
            )
        })
    }
}

fn to_config_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
