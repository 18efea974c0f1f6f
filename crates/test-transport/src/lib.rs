//! A scripted transport for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use seekloop_model::{
    ChatRequest, ErrorKind, ResponseDocument, Transport, TransportError,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
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

#[derive(Clone, Debug)]
enum ScriptStep {
    Preset(PresetResponse),
    Document(ResponseDocument),
    Raw(Bytes),
    Failure(ErrorKind, Option<u16>),
}

#[derive(Default)]
struct State {
    script: Vec<ScriptStep>,
    requests: Vec<ChatRequest>,
}

/// A local fake transport for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how
/// the service should respond to each exchange. The n-th exchange gets
/// the n-th step of the script, no matter what the request contains. If
/// there are no enough steps in the script, an error will be returned.
///
/// Clones share the same script and the same request log, so a test can
/// hand one clone to the orchestrator and inspect another afterwards.
///
/// # Note
///
/// This type is not optimized for production use, every request is
/// copied into the log. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestTransport {
    state: Arc<Mutex<State>>,
}

impl TestTransport {
    /// Appends a preset response to the script.
    #[inline]
    pub fn add_response_step(&self, preset: PresetResponse) {
        self.state().script.push(ScriptStep::Preset(preset));
    }

    /// Appends a complete response document to the script.
    #[inline]
    pub fn add_document_step(&self, document: ResponseDocument) {
        self.state().script.push(ScriptStep::Document(document));
    }

    /// Appends a raw response body to the script.
    #[inline]
    pub fn add_raw_step<B: Into<Bytes>>(&self, body: B) {
        self.state().script.push(ScriptStep::Raw(body.into()));
    }

    /// Appends a transport failure to the script.
    #[inline]
    pub fn add_failure_step(&self, kind: ErrorKind, status: Option<u16>) {
        self.state().script.push(ScriptStep::Failure(kind, status));
    }

    /// Returns how many exchanges were attempted.
    #[inline]
    pub fn invocations(&self) -> usize {
        self.state().requests.len()
    }

    /// Returns every request received so far, in order.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.state().requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test must not hide the requests from other clones.
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Debug for TestTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("TestTransport")
            .field("steps", &state.script.len())
            .field("invocations", &state.requests.len())
            .finish()
    }
}

impl Transport for TestTransport {
    type Error = crate::Error;

    fn execute(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send + 'static {
        let mut state = self.state();
        let turn = state.requests.len();
        state.requests.push(req.clone());

        let result = match state.script.get(turn).cloned() {
            None => Err(Error {
                message: format!("no step scripted for exchange {turn}"),
                kind: ErrorKind::Other,
                status: None,
            }),
            Some(ScriptStep::Failure(kind, status)) => Err(Error {
                message: format!("scripted failure at exchange {turn}"),
                kind,
                status,
            }),
            Some(ScriptStep::Raw(body)) => Ok(body),
            Some(ScriptStep::Preset(preset)) => {
                let document = preset.to_document(&req.model, turn + 1);
                encode(&document)
            }
            Some(ScriptStep::Document(document)) => encode(&document),
        };
        ready(result)
    }
}

fn encode(document: &ResponseDocument) -> Result<Bytes, Error> {
    serde_json::to_vec(document)
        .map(Bytes::from)
        .map_err(|err| Error {
            message: err.to_string(),
            kind: ErrorKind::Other,
            status: None,
        })
}
