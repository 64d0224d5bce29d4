use crate::fetch::DEFAULT_EXPORT_URL;
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;

const DEFAULT_OUTPUT_PATH: &str = "dist/index.html";

pub const TOKEN_VAR: &str = "READWISE_TOKEN";
pub const EXPORT_URL_VAR: &str = "READWISE_EXPORT_URL";
pub const OUTPUT_PATH_VAR: &str = "OUTPUT_PATH";

#[derive(Parser, Debug, Default)]
#[command(name = "all-the-highlights")]
#[command(about = "Export Readwise highlights into a single static HTML page")]
pub struct CliArgs {
    /// Readwise access token (falls back to READWISE_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Export endpoint to page through
    #[arg(long)]
    pub base_url: Option<String>,

    /// Where the rendered HTML is written
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub token: String,
    pub base_url: String,
    pub output_path: PathBuf,
}

// The token stays out of debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("output_path", &self.output_path)
            .finish()
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing access token: set READWISE_TOKEN or pass --token")]
    MissingToken,
    #[error("Invalid export URL: '{0}'. Expected an absolute http(s) URL")]
    InvalidBaseUrl(String),
}

impl Config {
    /// Resolves configuration from the command line, then the process
    /// environment (including a `.env` file), then defaults.
    pub fn load(cli: CliArgs) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_args(cli, |key| std::env::var(key).ok())
    }

    pub fn from_args<F>(cli: CliArgs, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = cli
            .token
            .or_else(|| env(TOKEN_VAR))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let base_url = cli
            .base_url
            .or_else(|| env(EXPORT_URL_VAR))
            .unwrap_or_else(|| DEFAULT_EXPORT_URL.to_string());
        validate_url(&base_url)?;

        let output_path = cli
            .output
            .or_else(|| env(OUTPUT_PATH_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        Ok(Config {
            token,
            base_url,
            output_path,
        })
    }
}

fn validate_url(s: &str) -> Result<(), ConfigError> {
    match Url::parse(s) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidBaseUrl(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_cli(token: Option<&str>, base_url: Option<&str>, output: Option<&str>) -> CliArgs {
        CliArgs {
            token: token.map(String::from),
            base_url: base_url.map(String::from),
            output: output.map(PathBuf::from),
            json_logs: false,
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_token_from_env() {
        let config = Config::from_args(make_cli(None, None, None), env_of(&[(TOKEN_VAR, "abc123")])).unwrap();

        assert_eq!(config.token, "abc123");
    }

    #[test]
    fn test_flag_overrides_env() {
        let env = env_of(&[(TOKEN_VAR, "from-env"), (OUTPUT_PATH_VAR, "env.html")]);

        let config = Config::from_args(make_cli(Some("from-flag"), None, Some("flag.html")), env).unwrap();

        assert_eq!(config.token, "from-flag");
        assert_eq!(config.output_path, PathBuf::from("flag.html"));
    }

    #[test]
    fn test_missing_token_is_error() {
        let result = Config::from_args(make_cli(None, None, None), env_of(&[]));

        assert_eq!(result, Err(ConfigError::MissingToken));
    }

    #[test]
    fn test_blank_token_is_error() {
        let result = Config::from_args(make_cli(None, None, None), env_of(&[(TOKEN_VAR, "   ")]));

        assert_eq!(result, Err(ConfigError::MissingToken));
    }

    #[test]
    fn test_default_url_and_output() {
        let config = Config::from_args(make_cli(Some("t"), None, None), env_of(&[])).unwrap();

        assert_eq!(config.base_url, "https://readwise.io/api/v2/export/");
        assert_eq!(config.output_path, PathBuf::from("dist/index.html"));
    }

    #[test]
    fn test_base_url_from_env() {
        let env = env_of(&[(EXPORT_URL_VAR, "http://localhost:8080/export/")]);

        let config = Config::from_args(make_cli(Some("t"), None, None), env).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/export/");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Config::from_args(make_cli(Some("t"), Some("ftp://example.com"), None), env_of(&[]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidBaseUrl("ftp://example.com".to_string()))
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_args(make_cli(Some("secret-token"), None, None), env_of(&[])).unwrap();

        assert!(!format!("{:?}", config).contains("secret-token"));
    }
}
