//! A transport for the DeepSeek chat-completion API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mime::Mime;
use reqwest::{Client, Method, RequestBuilder, Response, header};
use seekloop_model::{
    Cancellation, Capture, CaptureOutcome, ChatRequest, ErrorKind, Transport,
    TransportError,
};
use serde::de::DeserializeOwned;
use tokio::time;
use tracing::Instrument;

pub use config::{
    API_KEY_ENV, BASE_URL_ENV, DeepSeekConfig, DeepSeekConfigBuilder,
    RetryPolicy,
};
pub use proto::{BalanceInfo, ModelInfo, ModelList, UserBalance};

const CANCELLATION_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Error type for [`DeepSeekClient`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    fn cancelled() -> Self {
        Self::new("Request cancelled by the caller", ErrorKind::Cancelled)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

/// Maps a non-success HTTP status to an error.
///
/// Only 429 and 503 are worth retrying; the other statuses are final.
fn classify_status(status: u16, body: &str) -> Error {
    let (reason, kind) = match status {
        400 => ("Invalid format", ErrorKind::Client),
        401 => ("Authentication failed", ErrorKind::Client),
        402 => ("Insufficient balance", ErrorKind::Client),
        422 => ("Invalid parameters", ErrorKind::Client),
        429 => ("Rate limit or quota exceeded", ErrorKind::Transient),
        503 => ("Server overloaded", ErrorKind::Transient),
        500 => ("Server encountered an issue", ErrorKind::Server),
        501..=599 => ("Server error", ErrorKind::Server),
        _ => ("Unexpected status", ErrorKind::Other),
    };
    Error {
        message: format!("{reason} (HTTP {status}): {body}"),
        kind,
        status: Some(status),
    }
}

/// DeepSeek chat-completion client.
#[derive(Clone, Debug)]
pub struct DeepSeekClient {
    client: Client,
    config: Arc<DeepSeekConfig>,
}

impl DeepSeekClient {
    /// Creates a new `DeepSeekClient` with the given configuration.
    #[inline]
    pub fn new(config: DeepSeekConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Lists the models available to the account.
    pub async fn list_models(&self) -> Result<ModelList, Error> {
        self.get("/models").await
    }

    /// Queries the balance of the account.
    pub async fn user_balance(&self) -> Result<UserBalance, Error> {
        self.get("/user/balance").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let (_, body) =
            send_with_retry(&self.client, &self.config, Method::GET, path, None)
                .await?;
        serde_json::from_slice(&body).map_err(|err| {
            Error::new(format!("Failed to parse response: {err}"), ErrorKind::Other)
        })
    }
}

impl Transport for DeepSeekClient {
    type Error = Error;

    fn execute(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send + 'static {
        let body = serde_json::to_string(&proto::create_request(req));
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let timeout = req.timeout;
        let cancellation = req.cancellation.clone();
        let capture = req.capture.clone();
        let span = debug_span!("exchange", model = %req.model);

        async move {
            let body = body.map_err(|err| {
                Error::new(
                    format!("Failed to encode request: {err}"),
                    ErrorKind::Other,
                )
            })?;
            trace!("Request body: {body}");

            let exchange = async {
                if cancellation.as_ref().is_some_and(Cancellation::is_cancelled)
                {
                    return Err(Error::cancelled());
                }
                let retried = send_with_retry(
                    &client,
                    &config,
                    Method::POST,
                    "/chat/completions",
                    Some((body.clone(), cancellation.clone())),
                );
                match &cancellation {
                    Some(cancellation) => {
                        until_cancelled(retried, cancellation).await
                    }
                    None => retried.await,
                }
            };
            let result = match timeout {
                Some(timeout) => time::timeout(timeout, exchange)
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::new(
                            format!("Request timed out after {timeout:?}"),
                            ErrorKind::TimedOut,
                        ))
                    }),
                None => exchange.await,
            };

            if let Some(capture) = &capture {
                let outcome = match &result {
                    Ok((status, body)) => CaptureOutcome::Success {
                        status: *status,
                        body: String::from_utf8_lossy(body).into_owned(),
                    },
                    Err(err) => CaptureOutcome::Failure {
                        status: err.status,
                        message: err.message.clone(),
                    },
                };
                capture.capture(&Capture {
                    request_body: body,
                    outcome,
                });
            }

            let (_, body) = result?;
            trace!("Response body: {}", String::from_utf8_lossy(&body));
            Ok(body)
        }
        .instrument(span)
    }
}

/// Sends a request, retrying transient failures with exponential
/// backoff. `payload` is the JSON body and the cancellation predicate
/// checked before each attempt.
async fn send_with_retry(
    client: &Client,
    config: &DeepSeekConfig,
    method: Method,
    path: &str,
    payload: Option<(String, Option<Cancellation>)>,
) -> Result<(u16, Bytes), Error> {
    let url = format!("{}{path}", config.base_url);
    let (body, cancellation) = match payload {
        Some((body, cancellation)) => (Some(body), cancellation),
        None => (None, None),
    };

    let operation = || {
        let mut request = client
            .request(method.clone(), url.as_str())
            .bearer_auth(&config.api_key)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = &body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        let cancelled =
            cancellation.as_ref().is_some_and(Cancellation::is_cancelled);

        async move {
            if cancelled {
                return Err(backoff::Error::permanent(Error::cancelled()));
            }
            attempt(request).await.map_err(|err| {
                if err.kind == ErrorKind::Transient {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        }
    };

    debug!("Sending {method} {url}");
    backoff::future::retry_notify(
        config.retry.to_backoff(),
        operation,
        |err: Error, delay: Duration| {
            warn!("Retrying in {delay:?} after transient failure: {err}");
        },
    )
    .await
}

async fn attempt(request: RequestBuilder) -> Result<(u16, Bytes), Error> {
    let resp = request.send().await.map_err(|err| {
        Error::new(format!("Failed to send request: {err}"), ErrorKind::Other)
    })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(classify_status(status.as_u16(), &body));
    }
    check_content_type(&resp)?;

    let body = resp.bytes().await.map_err(|err| {
        Error::new(format!("Failed to read response: {err}"), ErrorKind::Other)
    })?;
    Ok((status.as_u16(), body))
}

fn check_content_type(resp: &Response) -> Result<(), Error> {
    // The header is optional, but when present it must denote JSON.
    let Some(content_type) = resp.headers().get(header::CONTENT_TYPE) else {
        return Ok(());
    };
    let is_json = content_type
        .to_str()
        .ok()
        .and_then(|v| v.parse::<Mime>().ok())
        .is_some_and(|m| m.type_() == mime::APPLICATION && m.subtype() == mime::JSON);
    if is_json {
        Ok(())
    } else {
        Err(Error::new(
            format!("Unexpected content type: {content_type:?}"),
            ErrorKind::Other,
        ))
    }
}

async fn until_cancelled<T>(
    fut: impl Future<Output = Result<T, Error>>,
    cancellation: &Cancellation,
) -> Result<T, Error> {
    let watch = async {
        loop {
            time::sleep(CANCELLATION_POLL_INTERVAL).await;
            if cancellation.is_cancelled() {
                break;
            }
        }
    };
    tokio::select! {
        result = fut => result,
        _ = watch => Err(Error::cancelled()),
    }
}
