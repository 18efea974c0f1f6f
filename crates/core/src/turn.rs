use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use seekloop_model::{ChatRequest, ResponseDocument, Transport, TransportError};
use tracing::Instrument;

use crate::Error;

type ExecuteResult = Result<Bytes, Box<dyn TransportError>>;
type BoxedExecuteFuture = Pin<Box<dyn Future<Output = ExecuteResult> + Send>>;
type HandlerFn = Arc<dyn Fn(&ChatRequest) -> BoxedExecuteFuture + Send + Sync>;

/// Sends one request snapshot through a transport and parses what comes
/// back.
///
/// This is a type-erased wrapper around a [`Transport`], so that the
/// orchestrator doesn't need a generic parameter. It only checks that the
/// body is a parseable response document; deciding whether the document
/// is usable is left to the orchestrator.
#[derive(Clone)]
pub struct TurnExecutor {
    handler_fn: HandlerFn,
}

impl TurnExecutor {
    /// Wraps a transport.
    #[inline]
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        // Erase the type `T`, the executor is passed around without a
        // generic parameter.
        let handler_fn: HandlerFn = Arc::new(
            move |req: &ChatRequest| -> BoxedExecuteFuture {
                let fut = transport.execute(req);
                Box::pin(async move {
                    fut.await.map_err(|err| {
                        Box::new(err) as Box<dyn TransportError>
                    })
                })
            },
        );
        Self { handler_fn }
    }

    /// Executes one turn.
    pub async fn send(
        &self,
        req: &ChatRequest,
    ) -> Result<ResponseDocument, Error> {
        let fut = (self.handler_fn)(req);
        let body = async move {
            trace!("sending {} messages", req.messages.len());
            fut.await
        }
        .instrument(trace_span!("turn executor"))
        .await
        .map_err(|err| {
            error!("transport failed: {err}");
            Error::Transport(err)
        })?;

        trace!("got a response of {} bytes", body.len());
        serde_json::from_slice(&body).map_err(|err| {
            Error::MalformedResponse(format!("unparseable body: {err}"))
        })
    }
}
