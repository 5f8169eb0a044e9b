// Domain errors surfaced to API callers
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FleetError {
    #[error("robot {0} not found")]
    RobotNotFound(String),

    #[error("alert {0} not found")]
    AlertNotFound(String),

    #[error("no telemetry session for robot {0}")]
    SessionNotFound(String),

    #[error("Please select a firmware file first.")]
    NoFirmwareSelected,

    #[error("firmware update already in progress for robot {0}")]
    UpdateInProgress(String),

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}
