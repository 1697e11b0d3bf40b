//! Traits describing the upstream boundary and the error taxonomy shared by all layers.

use std::string::FromUtf8Error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::{OperatorMeta, RegistrationNumber};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while retrieving the upstream snapshot.
pub enum FetchError {
    /// Network layer failed, timed out, or the operator answered with an error status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The document is not valid UTF-8.
    #[error("Decode error: {0}")]
    Decode(#[from] FromUtf8Error),
    /// No script block with the expected assignments was found.
    #[error("Embedded container data not found")]
    NotFound,
}

#[derive(thiserror::Error, Debug)]
/// Errors raised while decoding the embedded records.
pub enum ExtractError {
    /// An array literal could not be decoded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] JsonError),
    /// An array literal opened but never closed.
    #[error("Unterminated literal for `{variable}`")]
    UnterminatedLiteral {
        /// Variable whose literal is cut off.
        variable: String,
    },
}

#[derive(thiserror::Error, Debug)]
/// Errors surfaced to callers of the query service.
pub enum QueryError {
    /// The snapshot could not be retrieved or located.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] FetchError),
    /// The snapshot was retrieved but its records are not decodable.
    #[error("Upstream data invalid: {0}")]
    UpstreamDataInvalid(#[source] ExtractError),
    /// The reference container is absent or has no coordinates.
    #[error("Container {0} not found")]
    ReferenceNotFound(RegistrationNumber),
    /// The radius is negative or not a finite number.
    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),
}

impl From<FetchError> for QueryError {
    fn from(err: FetchError) -> Self {
        Self::UpstreamUnavailable(err)
    }
}

impl From<ExtractError> for QueryError {
    fn from(err: ExtractError) -> Self {
        Self::UpstreamDataInvalid(err)
    }
}

#[async_trait]
/// Trait for operator-specific retrieval of the raw container page.
pub trait UpstreamPort: Send + Sync {
    /// Metadata describing the operator served by this port.
    fn operator(&self) -> &OperatorMeta;

    /// Download the page as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] when the request fails or the status is not a success.
    async fn fetch_document(&self) -> Result<Vec<u8>, FetchError>;
}

/// Strategy for finding the embedded data block inside a document.
pub trait PayloadLocator: Send + Sync {
    /// Return the text of the block holding the records, if any.
    fn locate(&self, document: &str) -> Option<String>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
