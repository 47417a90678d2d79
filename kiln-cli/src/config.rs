use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment};
use kiln_core::BuildOptions;
use kiln_core::build::DEFAULT_CONFIG_FILE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Command line options after merging CLI args, env vars and defaults
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KilnConfig {
    /// Project root
    pub root: String,
    /// Site configuration file, relative to the root
    pub config: String,
    /// Host for the dev server
    pub host: String,
    /// Port for the dev server
    pub port: u16,
    /// Open a browser once the dev server is up
    pub open: bool,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            config: DEFAULT_CONFIG_FILE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            open: false,
        }
    }
}

impl KilnConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (KILN_*)
    /// 3. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        Self::load_with_env(args, Environment::with_prefix("KILN"))
    }

    fn load_with_env(args: &ArgMatches, env: Environment) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        builder = builder.add_source(ConfigBuilder::try_from(&Self::default())?);

        // 2. Environment variables with KILN_ prefix
        builder = builder.add_source(env.prefix_separator("_").try_parsing(true));

        // 3. Override with CLI arguments that were actually given
        let mut cli_overrides = HashMap::new();

        if let Some(root) = args.try_get_one::<String>("root").unwrap_or(None) {
            cli_overrides.insert("root".to_string(), root.clone());
        }
        if let Some(config) = args.try_get_one::<String>("config").unwrap_or(None) {
            cli_overrides.insert("config".to_string(), config.clone());
        }
        // host, port and open only exist on `serve`
        if let Some(host) = args.try_get_one::<String>("host").unwrap_or(None) {
            cli_overrides.insert("host".to_string(), host.clone());
        }
        if let Some(port) = args.try_get_one::<u16>("port").unwrap_or(None) {
            cli_overrides.insert("port".to_string(), port.to_string());
        }
        if args.try_get_one::<bool>("open").unwrap_or(None) == Some(&true) {
            cli_overrides.insert("open".to_string(), "true".to_string());
        }

        if !cli_overrides.is_empty() {
            builder = builder.add_source(ConfigBuilder::try_from(&cli_overrides)?);
        }

        let config: KilnConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions::new(&self.root).config_file(&self.config)
    }
}
