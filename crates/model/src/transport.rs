use std::error::Error;

use bytes::Bytes;

use crate::error::ErrorKind;
use crate::request::ChatRequest;

/// The error type for a transport.
pub trait TransportError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the HTTP status code of the failed exchange, if the
    /// service responded at all.
    fn status(&self) -> Option<u16> {
        None
    }
}

/// A type that moves one request snapshot to the remote service and
/// brings back the raw response body.
///
/// Implementations own everything below the orchestrator: connection
/// handling, authentication, retrying transient failures with backoff,
/// and honoring the cancellation and timeout controls carried by the
/// request. Once an error is returned, the orchestrator treats it as
/// terminal and never retries on its own.
pub trait Transport: Send + Sync {
    /// The error type that may be returned by the transport.
    type Error: TransportError;

    /// Executes one exchange and returns the raw response body.
    fn execute(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send + 'static;
}
