use anyhow::{Context, Result};
use clap::Parser;
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "tidyq", version, about = "Deletes idle control queues through the RabbitMQ management API")]
pub(crate) struct CliConfig {
    /// Path to the config file
    #[arg(short, long, value_name = "FILE", env = "TIDYQ_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Base url of the management API
    #[arg(long, env = "TIDYQ_URL")]
    pub(crate) url: Option<String>,

    #[arg(long, env = "TIDYQ_USERNAME")]
    pub(crate) username: Option<String>,

    #[arg(long, env = "TIDYQ_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,

    /// Queues starting with this prefix are deleted if unused
    #[arg(long, env = "TIDYQ_PREFIX")]
    pub(crate) prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) management: Management,
    pub(crate) tidy: Tidy,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Management {
    pub(crate) url: String,
    pub(crate) username: String,
    pub(crate) password: String,
}

impl Default for Management {
    fn default() -> Self {
        Management {
            url: "http://localhost:15672".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Tidy {
    pub(crate) prefix: String,
}

impl Default for Tidy {
    fn default() -> Self {
        Tidy {
            prefix: "Control.".to_string(),
        }
    }
}

pub(crate) fn parse_config(path: &Path) -> Result<Config> {
    let cfg = std::fs::read_to_string(path).with_context(|| format!("Cannot read config file {}", path.display()))?;

    Ok(toml::from_str(&cfg)?)
}

/// Command line arguments and environment variables override the config file, the config file
/// overrides the defaults.
pub(crate) fn resolve(cli: CliConfig) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => parse_config(path)?,
        None => Config::default(),
    };

    if let Some(url) = cli.url {
        config.management.url = url;
    }
    if let Some(username) = cli.username {
        config.management.username = username;
    }
    if let Some(password) = cli.password {
        config.management.password = password;
    }
    if let Some(prefix) = cli.prefix {
        config.tidy.prefix = prefix;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("tidyq").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_point_to_local_broker() {
        let config = Config::default();

        assert_eq!(config.management.url, "http://localhost:15672");
        assert_eq!(config.management.username, "guest");
        assert_eq!(config.management.password, "guest");
        assert_eq!(config.tidy.prefix, "Control.");
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [management]
            url = "http://rabbit:15672"
            "#,
        )
        .unwrap();

        assert_eq!(config.management.url, "http://rabbit:15672");
        assert_eq!(config.management.username, "guest");
        assert_eq!(config.tidy, Tidy::default());
    }

    #[test]
    fn command_line_overrides_config_file() {
        let path = std::env::temp_dir().join(format!("tidyq-config-{}.toml", std::process::id()));

        std::fs::write(
            &path,
            r#"
            [management]
            url = "http://rabbit:15672"
            username = "admin"
            password = "secret"

            [tidy]
            prefix = "Ctl."
            "#,
        )
        .unwrap();

        let config = resolve(cli(&[
            "--config",
            path.to_str().unwrap(),
            "--username",
            "operator",
            "--prefix",
            "Control.",
        ]))
        .unwrap();

        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.management.url, "http://rabbit:15672");
        assert_eq!(config.management.username, "operator");
        assert_eq!(config.management.password, "secret");
        assert_eq!(config.tidy.prefix, "Control.");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = resolve(cli(&["-c", "/nonexistent/tidyq.toml"]));

        assert!(result.is_err());
    }
}
