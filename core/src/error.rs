//! Error taxonomy for the remote task collection.

use thiserror::Error;

use crate::model::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure, no response to speak of.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 5xx, or a 2xx whose body could not be decoded.
    #[error("server error: {0}")]
    Server(String),

    /// Non-404 4xx, the server rejected the input.
    #[error("validation rejected: {0}")]
    Validation(String),

    /// 404 for an id we thought existed.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}
