// Site root module
// Immutable serving configuration shared by every connection

use std::io;
use std::path::{Path, PathBuf};

use super::types::Config;

/// Immutable description of what is being served.
///
/// Built once at start-up and shared behind an `Arc`; nothing mutates it afterwards,
/// so several servers can run side by side in one process.
#[derive(Debug, Clone)]
pub struct SiteRoot {
    root: PathBuf,
    index_files: Vec<String>,
    server_name: String,
}

impl SiteRoot {
    /// Canonicalize `root` and check that it is a directory
    pub fn new(
        root: impl AsRef<Path>,
        index_files: Vec<String>,
        server_name: impl Into<String>,
    ) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("site root {} is not a directory", root.display()),
            ));
        }
        Ok(Self {
            root,
            index_files,
            server_name: server_name.into(),
        })
    }

    pub fn from_config(config: &Config) -> io::Result<Self> {
        Self::new(
            config.root_dir()?,
            config.http.index_files.clone(),
            config.http.server_name.clone(),
        )
    }

    /// Canonical root directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn index_files(&self) -> &[String] {
        &self.index_files
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}
