// Configuration utilities
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{DatasetLoader, XlsxEncoder, XlsxError, DEFAULT_EXPORT_FILE_NAME, DEFAULT_SHEET_NAME};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub enable_cors: bool,
}

/// Source file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: String,
    pub delimiter: char,
}

/// Load cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Option<u64>,
}

/// Spreadsheet export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub sheet_name: String,
    pub file_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            enable_cors: false,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            path: "result.csv".to_string(),
            delimiter: ',',
        }
    }
}

impl SourceConfig {
    /// Build a loader for the configured delimiter
    pub fn loader(&self) -> Result<DatasetLoader, String> {
        if !self.delimiter.is_ascii() {
            return Err(format!("Delimiter '{}' is not a single-byte character", self.delimiter));
        }
        Ok(DatasetLoader::new(self.delimiter as u8))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: 8,
            ttl: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl ExportConfig {
    /// Build the spreadsheet encoder for the configured sheet name
    pub fn encoder(&self) -> Result<XlsxEncoder, XlsxError> {
        XlsxEncoder::new(&self.sheet_name)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => return Err("Unsupported config file format".into()),
        };

        Ok(config)
    }

    /// Get the log level filter
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "source:\n  path: lances.csv\n  delimiter: ';'\nlogging:\n  level: debug").unwrap();
        file.flush().unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.source.path, "lances.csv");
        assert_eq!(config.source.delimiter, ';');
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.export.file_name, "dados_filtrados.xlsx");
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"cache": {{"capacity": 2, "ttl": 60}}, "export": {{"sheet_name": "Lances"}}}}"#).unwrap();
        file.flush().unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.cache.capacity, 2);
        assert_eq!(config.cache.ttl, Some(60));
        assert_eq!(config.export.encoder().unwrap().sheet_name(), "Lances");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let source = SourceConfig {
            path: "x.csv".to_string(),
            delimiter: 'é',
        };
        assert!(source.loader().is_err());
    }
}
