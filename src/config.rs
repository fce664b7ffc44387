//! Process Configuration
//!
//! Command-line flags for the `whois-history` binary.

use crate::ingestion::source::{DEFAULT_DELIMITER, parse_delimiter};
use crate::ingestion::types::{DEFAULT_BATCH_SIZE, IngestOptions};

use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

pub const USAGE: &str = "Usage: whois-history [--bind <addr:port>] [--csv-file <path>]... \
[--delimiter <char>] [--max-rows <n>] [--batch-size <n>] [--index-workers <n>] \
[--skip-indexes] [--no-serve]";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Files ingested before serving.
    pub csv_files: Vec<PathBuf>,
    pub delimiter: u8,
    pub max_rows: Option<u64>,
    pub batch_size: usize,
    /// `None` sizes the pool to available parallelism.
    pub index_workers: Option<usize>,
    pub provision_indexes: bool,
    pub serve: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            csv_files: Vec::new(),
            delimiter: DEFAULT_DELIMITER,
            max_rows: None,
            batch_size: DEFAULT_BATCH_SIZE,
            index_workers: None,
            provision_indexes: true,
            serve: true,
        }
    }
}

impl AppConfig {
    /// Parses flags, excluding the program name.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Self::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    let value = flag_value(args, i)?;
                    config.bind_addr = value
                        .parse()
                        .with_context(|| format!("invalid --bind address '{}'", value))?;
                    i += 2;
                }
                "--csv-file" => {
                    config.csv_files.push(PathBuf::from(flag_value(args, i)?));
                    i += 2;
                }
                "--delimiter" => {
                    config.delimiter = parse_delimiter(flag_value(args, i)?)?;
                    i += 2;
                }
                "--max-rows" => {
                    config.max_rows = Some(parse_number(args, i)?);
                    i += 2;
                }
                "--batch-size" => {
                    config.batch_size = parse_number(args, i)?;
                    i += 2;
                }
                "--index-workers" => {
                    config.index_workers = Some(parse_number(args, i)?);
                    i += 2;
                }
                "--skip-indexes" => {
                    config.provision_indexes = false;
                    i += 1;
                }
                "--no-serve" => {
                    config.serve = false;
                    i += 1;
                }
                other => return Err(anyhow!("unknown argument '{}'", other)),
            }
        }

        if config.batch_size == 0 {
            return Err(anyhow!("--batch-size must be at least 1"));
        }

        Ok(config)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            batch_size: self.batch_size,
            max_rows: self.max_rows,
            ..IngestOptions::default()
        }
    }
}

fn flag_value(args: &[String], i: usize) -> Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", args[i]))
}

fn parse_number<T>(args: &[String], i: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = flag_value(args, i)?;
    value
        .parse()
        .with_context(|| format!("invalid value '{}' for {}", value, args[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_args(&[]).unwrap();

        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND);
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.batch_size, 10_000);
        assert!(config.serve);
        assert!(config.provision_indexes);
    }

    #[test]
    fn test_full_flag_set() {
        let config = AppConfig::from_args(&args(&[
            "--bind",
            "0.0.0.0:8080",
            "--csv-file",
            "a.csv",
            "--csv-file",
            "b.csv",
            "--delimiter",
            ";",
            "--max-rows",
            "500",
            "--batch-size",
            "250",
            "--index-workers",
            "3",
            "--skip-indexes",
            "--no-serve",
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.csv_files.len(), 2);
        assert_eq!(config.delimiter, b';');
        assert_eq!(config.index_workers, Some(3));
        assert!(!config.serve);
        assert!(!config.provision_indexes);

        let options = config.ingest_options();
        assert_eq!(options.batch_size, 250);
        assert_eq!(options.max_rows, Some(500));
    }

    #[test]
    fn test_missing_value_is_error() {
        let err = AppConfig::from_args(&args(&["--bind"])).unwrap_err();
        assert!(err.to_string().contains("--bind requires a value"));
    }

    #[test]
    fn test_rejects_unknown_flag_and_bad_numbers() {
        assert!(AppConfig::from_args(&args(&["--seed", "x"])).is_err());
        assert!(AppConfig::from_args(&args(&["--max-rows", "-1"])).is_err());
        assert!(AppConfig::from_args(&args(&["--batch-size", "0"])).is_err());
    }
}
