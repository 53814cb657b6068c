//! Runtime configuration, read from the environment with local-dev defaults.

use std::env;
use std::path::PathBuf;

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root of all persisted state: temp uploads and the mappings document.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("ADBOARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("ADBOARD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let data_dir = env::var("ADBOARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        Self {
            host,
            port,
            data_dir,
        }
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("temp")
    }

    pub fn mappings_file(&self) -> PathBuf {
        self.data_dir.join("mappings.json")
    }
}
