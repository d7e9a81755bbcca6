//! # Errors
//! Error type for the fallible, I/O-facing parts of the planner: parameter
//! files, JSON values and snapshot export. Routine planning outcomes (a
//! rejected steer, no path to the goal yet) are not errors.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
