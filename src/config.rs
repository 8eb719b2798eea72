use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use log::info;

const DATABASE_FILE: &str = "fastlog.sqlite3";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub enable_cors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3001,
            data_dir: PathBuf::from("./data"),
            static_dir: None,
            enable_cors: true,
        }
    }
}

impl Config {
    /// Reads `FASTLOG_*` variables. Missing ones fall back to defaults; a
    /// value that fails to parse is an error.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind: try_load("FASTLOG_BIND", defaults.bind)?,
            port: try_load("FASTLOG_PORT", defaults.port)?,
            data_dir: try_load("FASTLOG_DATA_DIR", defaults.data_dir.display())?,
            static_dir: var("FASTLOG_STATIC_DIR").map(PathBuf::from),
            enable_cors: try_load("FASTLOG_CORS", defaults.enable_cors)?,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|err| anyhow!("invalid bind address {}:{}: {err}", self.bind, self.port))
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: impl Display) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|err| anyhow!("invalid {key} value '{raw}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_data_dir() {
        let config = Config::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.database_path(), PathBuf::from("./data/fastlog.sqlite3"));
        assert_eq!(config.address().unwrap().to_string(), "0.0.0.0:3001");
    }

    #[test]
    fn missing_variable_uses_default() {
        let port: u16 = try_load("FASTLOG_TEST_UNSET_PORT", 3001).unwrap();
        assert_eq!(port, 3001);
    }

    #[test]
    fn invalid_variable_is_an_error() {
        env::set_var("FASTLOG_TEST_BAD_PORT", "eighty");
        let result: Result<u16> = try_load("FASTLOG_TEST_BAD_PORT", 3001);
        env::remove_var("FASTLOG_TEST_BAD_PORT");
        assert!(result.is_err());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let config = Config {
            bind: "not an ip".into(),
            ..Config::default()
        };
        assert!(config.address().is_err());
    }
}
