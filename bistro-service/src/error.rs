use bistro_core::DispatchError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Menu is empty, cannot build demo orders")]
    EmptyMenu,
}
