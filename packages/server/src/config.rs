//! Command line and environment configuration.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use thiserror::Error;

use crate::{
    domain::CatalogError,
    infrastructure::{
        catalog::JsonFileCatalog,
        identity::{TokenTable, TokenTableError},
    },
};

/// Settings for the karaoke room server
#[derive(Parser, Debug, Clone)]
#[command(name = "karaoke-server")]
#[command(about = "Karaoke room server with a shared queue and player authority", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KARAOKE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "KARAOKE_PORT", default_value = "8080")]
    pub port: u16,

    /// How long an empty room survives before it is evicted (milliseconds)
    #[arg(long, env = "KARAOKE_EVICTION_GRACE_MS", default_value = "0")]
    pub eviction_grace_ms: u64,

    /// Restrict player claims to admin identities
    #[arg(long, env = "KARAOKE_CLAIM_REQUIRES_ADMIN")]
    pub claim_requires_admin: bool,

    /// JSON file mapping tokens to identities
    #[arg(long, env = "KARAOKE_TOKENS")]
    pub tokens: Option<PathBuf>,

    /// JSON file with the song catalog
    #[arg(long, env = "KARAOKE_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "KARAOKE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load token table: {0}")]
    Tokens(#[from] TokenTableError),

    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),
}

impl ServerConfig {
    pub fn eviction_grace(&self) -> Duration {
        Duration::from_millis(self.eviction_grace_ms)
    }

    /// Token table from `--tokens`; without one every connection is anonymous
    pub fn load_tokens(&self) -> Result<TokenTable, ConfigError> {
        match &self.tokens {
            Some(path) => Ok(TokenTable::from_file(path)?),
            None => {
                tracing::warn!("No token table configured; all connections will be anonymous");
                Ok(TokenTable::new())
            }
        }
    }

    pub fn load_catalog(&self) -> Result<JsonFileCatalog, ConfigError> {
        match &self.catalog {
            Some(path) => Ok(JsonFileCatalog::from_file(path)?),
            None => {
                tracing::warn!("No catalog configured; starting with an empty library");
                Ok(JsonFileCatalog::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // テスト項目: 引数なしで既定値が使われる
        // given (前提条件):
        let args = ["karaoke-server"];

        // when (操作):
        let config = ServerConfig::try_parse_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 8080);
        assert_eq!(config.eviction_grace(), Duration::ZERO);
        assert!(!config.claim_requires_admin);
        assert!(config.tokens.is_none());
    }

    #[test]
    fn test_flags_override_defaults() {
        // テスト項目: コマンドライン引数で設定を上書きできる
        // given (前提条件):
        let args = [
            "karaoke-server",
            "--port",
            "3000",
            "--eviction-grace-ms",
            "1500",
            "--claim-requires-admin",
        ];

        // when (操作):
        let config = ServerConfig::try_parse_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 3000);
        assert_eq!(config.eviction_grace(), Duration::from_millis(1500));
        assert!(config.claim_requires_admin);
    }

    #[test]
    fn test_missing_token_file_is_an_error() {
        // テスト項目: 存在しないトークンファイルは ConfigError::Tokens になる
        // given (前提条件):
        let config = ServerConfig::try_parse_from([
            "karaoke-server",
            "--tokens",
            "/nonexistent/karaoke-tokens.json",
        ])
        .unwrap();

        // when (操作):
        let result = config.load_tokens();

        // then (期待する結果):
        assert!(matches!(result, Err(ConfigError::Tokens(_))));
    }
}
