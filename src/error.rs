use crate::domain::widget::WidgetId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Invalid publishable key: {0}")]
    InvalidPublicKey(String),
    #[error("Mount point not found: {0}")]
    MountPointNotFound(String),
    #[error("Mount point already occupied: {0}")]
    MountPointOccupied(String),
    #[error("A payment widget is already mounted")]
    AlreadyMounted,
    #[error("No payment widget is mounted")]
    NotMounted,
    #[error("Widget {0} is no longer valid")]
    StaleWidget(WidgetId),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Price of {0} credits is out of range")]
    PriceOverflow(u32),
    #[error("Invalid script step: {0}")]
    ScriptError(String),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
