use hyper::http;
use std::{io, net::SocketAddr, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::Error),
    #[error("Http Error: {0}")]
    HttpError(#[from] http::Error),
    #[error("Invalid header name")]
    InvalidHeaderName,
    #[error("Invalid header value")]
    InvalidHeaderValue,
    #[error("The status code is invalid")]
    InvalidStatusCode,
    #[error("Invalid body")]
    InvalidBody,
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("The mock provider has already been started")]
    AlreadyStarted,
    #[error("The mock provider hasn't been started")]
    NotStarted,
    #[error("The mock provider at {0} did not become ready")]
    ServerNotReady(SocketAddr),
    #[error("Couldn't use {} as the pact directory: {source}", .path.display())]
    PactDirectory { path: PathBuf, source: io::Error },
    #[error(
        "Interaction '{description}' in {} differs from the one being written",
        .path.display()
    )]
    PactMergeConflict { path: PathBuf, description: String },
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

impl From<http::status::InvalidStatusCode> for Error {
    fn from(_: http::status::InvalidStatusCode) -> Self {
        Error::InvalidStatusCode
    }
}
