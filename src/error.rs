use crate::{matching::MatchFailure, mock_server::ExpectationReport};
use hyper::http;
use std::{fmt::Display, io, sync};

#[derive(Debug)]
pub enum Error {
    /// The mock server could not bind its port. Fatal to the session.
    ServerStart(String),
    /// The mock server rejected an interaction shape. Fatal to the session.
    Registration(String),
    /// Registered-but-unexercised interactions or unexpected requests.
    UnmetExpectations(ExpectationReport),
    /// The contract artifact could not be written.
    Persist(io::Error),
    /// The provider state hook answered with a non-2xx status.
    StateSetup { state: String, status: u16 },
    /// The actual response diverged from the expected one.
    Mismatch(Vec<MatchFailure>),
    /// Interactions can no longer be added after finalize.
    SessionFinalized,
    InvalidMethod(String),
    NotConfigured,
    IoError(io::Error),
    JsonError(serde_json::Error),
    PoisonedLock,
    InvalidHeaderName,
    InvalidHeaderValue,
    InvalidBody,
    HyperError(hyper::Error),
    HttpError(http::Error),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ServerStart(e) => write!(f, "The mock server could not start: {}", e),
            Error::Registration(e) => write!(f, "The interaction was rejected: {}", e),
            Error::UnmetExpectations(report) => write!(f, "Unmet expectations: {}", report),
            Error::Persist(e) => write!(f, "The pact file could not be written: {}", e),
            Error::StateSetup { state, status } => write!(
                f,
                "Provider state setup for '{}' answered with status {}",
                state, status
            ),
            Error::Mismatch(failures) => {
                write!(f, "{} response mismatch(es):", failures.len())?;
                for failure in failures {
                    write!(f, " {};", failure)?;
                }
                Ok(())
            }
            Error::SessionFinalized => {
                write!(f, "The session is finalized and accepts no more interactions")
            }
            Error::InvalidMethod(m) => write!(f, "'{}' is not a supported HTTP method", m),
            Error::NotConfigured => write!(f, "A required URL hasn't been configured"),
            Error::IoError(e) => write!(f, "IoError: {}", e),
            Error::JsonError(e) => write!(f, "Json error: {}", e),
            Error::PoisonedLock => write!(f, "The lock was poisoned"),
            Error::InvalidHeaderName => write!(f, "Invalid header name"),
            Error::InvalidHeaderValue => write!(f, "Invalid header value"),
            Error::InvalidBody => write!(f, "Invalid body"),
            Error::HyperError(e) => write!(f, "Hyper error: {}", e),
            Error::HttpError(e) => write!(f, "Http Error: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Self {
        Error::PoisonedLock
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(_: hyper::header::InvalidHeaderName) -> Self {
        Error::InvalidHeaderName
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(_: hyper::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeaderValue
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::HyperError(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::HttpError(e)
    }
}
