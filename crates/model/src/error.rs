use std::fmt::{self, Display};

/// The kind of error a [`Transport`](crate::Transport) may surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service rejected the request (4xx-class). Retrying the same
    /// request will not help.
    Client,
    /// The service is rate limited or temporarily overloaded, and the
    /// transport has already exhausted its retries.
    Transient,
    /// The service failed to process the request (5xx-class).
    Server,
    /// The caller cancelled the exchange.
    Cancelled,
    /// The exchange exceeded its time budget.
    TimedOut,
    /// Any other errors, e.g. connection failures.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Client => write!(f, "client error"),
            ErrorKind::Transient => write!(f, "transient error"),
            ErrorKind::Server => write!(f, "server error"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
            ErrorKind::TimedOut => write!(f, "timed out"),
            ErrorKind::Other => write!(f, "other error"),
        }
    }
}
