use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "data_analysis_mcp=info,mcp_server=info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where generated images go; `None` writes into the working directory.
    pub output_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            output_dir: env::var("DATA_ANALYSIS_OUTPUT_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            if !dir.is_dir() {
                bail!("Output directory {} does not exist", dir.display());
            }
        }
        Ok(())
    }
}
