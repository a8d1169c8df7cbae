use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "histoproc.toml";

/// Prefix for environment overrides, nested keys are split on `__`
pub const ENV_PREFIX: &str = "HISTOPROC__";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcceptorConfig {
    /// Address the OTLP/gRPC receiver listens on
    pub grpc_addr: String,
    /// Maximum time to wait for in-flight requests when shutting down
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        Self {
            grpc_addr: String::from("0.0.0.0:4317"),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Settings of the histogram percentile processor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistogramProcessorConfig {
    /// Component id in `type[/name]` form
    pub id: String,
    /// When disabled, batches are forwarded untouched
    pub enabled: bool,
}

impl Default for HistogramProcessorConfig {
    fn default() -> Self {
        Self {
            id: String::from("histogram"),
            enabled: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProcessorsConfig {
    pub histogram: HistogramProcessorConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// OTLP receiver configuration
    pub acceptor: AcceptorConfig,
    /// Pipeline processors
    pub processors: ProcessorsConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(path.as_ref()))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
