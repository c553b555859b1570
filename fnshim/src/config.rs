//! Configuration management

use fnshim_function::FunctionConfig;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub function: FunctionConfig,
}

/// Local function host settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

// netlify dev's default functions port
fn default_port() -> u16 {
    9999
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Without an explicit path an optional `fnshim.toml` in the working
    /// directory is read. `FNSHIM__SECTION__KEY` variables override both.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("fnshim").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("FNSHIM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }
}
