use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("invalid component id '{0}'")]
    InvalidComponentId(String),

    #[error("component type mismatch: expected '{expected}', found '{found}'")]
    ComponentTypeMismatch { expected: String, found: String },

    #[error("processor has been shut down")]
    ShutDown,

    #[error("downstream consumer failed: {0}")]
    Downstream(String),
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
