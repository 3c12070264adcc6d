/// The propagation policy of an error of a node service.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A transient failure: the same step is retried after a delay.
    Retryable,
    /// A chain reorganization: the service rolls back to a known good block.
    Recoverable,
    /// Any other failure: the service stops.
    Fatal,
}
