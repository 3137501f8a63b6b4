//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::CascadeConfig;
use anyhow::{Context, Result};

/// Environment variable holding the optional remove.bg API key
pub(crate) const REMOVE_BG_KEY_ENV: &str = "REMOVE_BG_API_KEY";

/// Convert CLI arguments to a validated `CascadeConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration from CLI arguments and the environment
    pub(crate) fn from_cli(cli: &Cli) -> Result<CascadeConfig> {
        Self::from_cli_with_key(cli, std::env::var(REMOVE_BG_KEY_ENV).ok())
    }

    /// Build the configuration with an explicit remove.bg key source
    ///
    /// A key in the configuration file wins over the environment.
    pub(crate) fn from_cli_with_key(cli: &Cli, env_key: Option<String>) -> Result<CascadeConfig> {
        let mut config = match &cli.config {
            Some(path) => CascadeConfig::from_json_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => CascadeConfig::default(),
        };

        if let Some(model) = &cli.model {
            if !model.is_file() {
                anyhow::bail!("Model file not found: {}", model.display());
            }
            config.background.local_model.model_path = Some(model.clone());
        }
        if cli.no_local_model {
            config.background.local_model.enabled = false;
        }
        let file_key = config
            .background
            .remove_bg_api_key
            .take()
            .filter(|k| !k.trim().is_empty());
        config.background.remove_bg_api_key =
            file_key.or_else(|| env_key.filter(|k| !k.trim().is_empty()));

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("media-cascade").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = CliConfigBuilder::from_cli_with_key(&parse(&["crop", "a.png"]), None).unwrap();
        assert_eq!(config, CascadeConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("u2net.onnx");
        std::fs::write(&model, b"onnx").unwrap();

        let cli = parse(&["background", "a.png", "--model", model.to_str().unwrap(), "--no-local-model"]);
        let config = CliConfigBuilder::from_cli_with_key(&cli, Some("key-123".into())).unwrap();

        assert_eq!(config.background.local_model.model_path.as_deref(), Some(model.as_path()));
        assert!(!config.background.local_model.enabled);
        assert_eq!(config.background.remove_bg_api_key.as_deref(), Some("key-123"));
    }

    #[test]
    fn test_config_file_key_wins_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"background": {"remove_bg_api_key": "from-file", "white_threshold": 230}}"#,
        )
        .unwrap();

        let cli = parse(&["text", "a.png", "--config", path.to_str().unwrap()]);
        let config = CliConfigBuilder::from_cli_with_key(&cli, Some("from-env".into())).unwrap();
        assert_eq!(config.background.remove_bg_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.background.white_threshold, 230);
    }

    #[test]
    fn test_missing_model_file_is_rejected() {
        let cli = parse(&["background", "a.png", "--model", "/nonexistent/u2net.onnx"]);
        assert!(CliConfigBuilder::from_cli_with_key(&cli, None).is_err());
    }

    #[test]
    fn test_blank_environment_key_is_ignored() {
        let config =
            CliConfigBuilder::from_cli_with_key(&parse(&["crop", "a.png"]), Some("  ".into()))
                .unwrap();
        assert!(config.background.remove_bg_api_key.is_none());
    }

    #[test]
    fn test_blank_file_key_falls_back_to_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"background": {"remove_bg_api_key": "  "}}"#).unwrap();

        let cli = parse(&["background", "a.png", "--config", path.to_str().unwrap()]);
        let config = CliConfigBuilder::from_cli_with_key(&cli, Some("from-env".into())).unwrap();
        assert_eq!(config.background.remove_bg_api_key.as_deref(), Some("from-env"));

        let config = CliConfigBuilder::from_cli_with_key(&cli, None).unwrap();
        assert!(config.background.remove_bg_api_key.is_none());
    }
}
