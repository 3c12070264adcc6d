/// The default polling interval of the latest L1 header, in seconds.
pub(crate) const DEFAULT_L1_SLOT_INTERVAL: u64 = 12;

/// The default polling interval of the safe and finalized L1 headers, in seconds.
pub(crate) const DEFAULT_L1_EPOCH_INTERVAL: u64 = 384;

/// The default timeout of the L1 header requests, in seconds.
pub(crate) const DEFAULT_L1_REQUEST_TIMEOUT: u64 = 10;

/// The default maximum number of attempts of a derivation step.
pub(crate) const DEFAULT_DERIVATION_MAX_ATTEMPTS: usize = 10;

/// The default delay after the first failed derivation attempt, in milliseconds.
pub(crate) const DEFAULT_DERIVATION_INITIAL_BACKOFF: u64 = 100;

/// The default wait between two derivation steps once caught up with the L1, in milliseconds.
pub(crate) const DEFAULT_DERIVATION_STEP_INTERVAL: u64 = 1000;

/// The default soft limit on the size of a batch, in bytes.
pub(crate) const DEFAULT_MAX_BATCH_SIZE: usize = 100_000;

/// The default interval between two batch submissions, in seconds.
pub(crate) const DEFAULT_SUBMISSION_INTERVAL: u64 = 12;

/// The default timeout waiting for a batch transaction receipt, in seconds.
pub(crate) const DEFAULT_CONFIRMATION_TIMEOUT: u64 = 120;
