/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The content is moderated.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The transport failed: connection errors, timeouts, non-2xx
    /// statuses and broken streams.
    Network,
    /// Any other errors.
    Other,
}
