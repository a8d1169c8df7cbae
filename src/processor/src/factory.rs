use std::fmt;
use std::str::FromStr;

use common::config::HistogramProcessorConfig;

use crate::consumer::{Capabilities, MetricsConsumer};
use crate::error::{ProcessorError, Result};
use crate::histogram_processor::HistogramProcessor;

/// Identifies a pipeline component as `type` or `type/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentId {
    component_type: String,
    name: Option<String>,
}

impl ComponentId {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: None,
        }
    }

    pub fn with_name(component_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: Some(name.into()),
        }
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl FromStr for ComponentId {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProcessorError::InvalidComponentId(s.to_string());

        if s.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        match s.split_once('/') {
            None if !s.is_empty() => Ok(Self::new(s)),
            Some((component_type, name))
                if !component_type.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::with_name(component_type, name))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{name}", self.component_type),
            None => write!(f, "{}", self.component_type),
        }
    }
}

/// Maturity of a pipeline component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Development,
    Alpha,
    Beta,
    Stable,
}

/// Builds histogram processors from configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistogramProcessorFactory;

impl HistogramProcessorFactory {
    pub const TYPE: &'static str = "histogram";

    pub fn new() -> Self {
        Self
    }

    pub fn component_type(&self) -> &'static str {
        Self::TYPE
    }

    pub fn stability(&self) -> Stability {
        Stability::Development
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities { mutates_data: true }
    }

    pub fn create_default_config(&self) -> HistogramProcessorConfig {
        HistogramProcessorConfig {
            id: Self::TYPE.to_string(),
            enabled: true,
        }
    }

    /// Checks that the configured id is well formed and names this factory's
    /// component type.
    pub fn validate_config(&self, config: &HistogramProcessorConfig) -> Result<ComponentId> {
        let id: ComponentId = config.id.parse()?;
        if id.component_type() != Self::TYPE {
            return Err(ProcessorError::ComponentTypeMismatch {
                expected: Self::TYPE.to_string(),
                found: id.component_type().to_string(),
            });
        }
        Ok(id)
    }

    /// Creates a processor forwarding to `next`.
    pub fn create_metrics_processor<C: MetricsConsumer>(
        &self,
        config: &HistogramProcessorConfig,
        next: C,
    ) -> Result<HistogramProcessor<C>> {
        let id = self.validate_config(config)?;

        tracing::debug!(
            processor = %id,
            enabled = config.enabled,
            "Creating histogram processor"
        );
        Ok(HistogramProcessor::new(id, config.enabled, next))
    }
}
