use cqrs_es::AggregateError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Failure raised by the event store or framework, never by input.
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<AggregateError<Error>> for Error {
    fn from(err: AggregateError<Error>) -> Self {
        match err {
            AggregateError::UserError(err) => err,
            other => Error::Unexpected {
                message: other.to_string(),
            },
        }
    }
}
