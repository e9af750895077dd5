use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum TriagoError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Title and description are required")]
    InvalidTicket,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
