use crate::constants;
use std::time::Duration;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use clap::ArgAction;
use rollup_derivation_pipeline::{DriverConfig, RetryPolicy};
use rollup_l1::L1Contracts;
use rollup_node_batcher::BatcherConfig;
use rollup_node_watcher::SyncerConfig;

/// The arguments of the rollup node.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "rollup-node", about = "Derives the L2 chain from the L1 and posts L2 batches")]
pub struct RollupNodeArgs {
    /// The L1 arguments.
    #[command(flatten)]
    pub l1: L1Args,
    /// The L2 arguments.
    #[command(flatten)]
    pub l2: L2Args,
    /// The L1 contracts arguments.
    #[command(flatten)]
    pub contracts: ContractsArgs,
    /// The derivation arguments.
    #[command(flatten)]
    pub derivation: DerivationArgs,
    /// The batcher arguments.
    #[command(flatten)]
    pub batcher: BatcherArgs,
    /// The logging arguments.
    #[command(flatten)]
    pub log: LogArgs,
}

impl RollupNodeArgs {
    /// Validates that a signer is provided when the batcher is enabled.
    pub fn validate(&self) -> Result<(), String> {
        if self.batcher.enabled && self.batcher.private_key.is_none() {
            return Err("A private key is required when the batcher is enabled".to_string())
        }
        Ok(())
    }
}

/// The arguments for the L1.
#[derive(Debug, Clone, clap::Args)]
pub struct L1Args {
    /// The L1 RPC URL.
    #[arg(long = "l1.rpc-url", id = "l1_rpc_url", value_name = "L1_RPC_URL", env = "L1_RPC_URL")]
    pub rpc_url: String,
    /// The polling interval of the latest L1 header, in seconds.
    #[arg(long = "l1.slot-interval", value_name = "SECONDS", default_value_t = constants::DEFAULT_L1_SLOT_INTERVAL)]
    pub slot_interval: u64,
    /// The polling interval of the safe and finalized L1 headers, in seconds.
    #[arg(long = "l1.epoch-interval", value_name = "SECONDS", default_value_t = constants::DEFAULT_L1_EPOCH_INTERVAL)]
    pub epoch_interval: u64,
    /// The timeout of the L1 header requests, in seconds.
    #[arg(long = "l1.request-timeout", value_name = "SECONDS", default_value_t = constants::DEFAULT_L1_REQUEST_TIMEOUT)]
    pub request_timeout: u64,
}

impl L1Args {
    /// Returns the [`SyncerConfig`] of the L1 header polling.
    pub const fn syncer_config(&self) -> SyncerConfig {
        SyncerConfig {
            slot_interval: Duration::from_secs(self.slot_interval),
            epoch_interval: Duration::from_secs(self.epoch_interval),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }
}

/// The arguments for the L2.
#[derive(Debug, Clone, clap::Args)]
pub struct L2Args {
    /// The L2 RPC URL.
    #[arg(long = "l2.rpc-url", id = "l2_rpc_url", value_name = "L2_RPC_URL", env = "L2_RPC_URL")]
    pub rpc_url: String,
    /// The L2 Engine API URL.
    #[arg(long = "l2.engine-url", value_name = "L2_ENGINE_URL", env = "L2_ENGINE_URL")]
    pub engine_url: String,
    /// The fee recipient of the derived L2 blocks.
    #[arg(long = "l2.fee-recipient", value_name = "ADDRESS", default_value_t = Address::ZERO)]
    pub fee_recipient: Address,
}

/// The arguments for the L1 contracts.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct ContractsArgs {
    /// The address of the sequencer inbox.
    #[arg(long = "contracts.inbox", value_name = "ADDRESS", env = "CONTRACTS_INBOX")]
    pub inbox: Address,
    /// The address of the rollup contract.
    #[arg(long = "contracts.rollup", value_name = "ADDRESS", env = "CONTRACTS_ROLLUP")]
    pub rollup: Address,
}

impl From<ContractsArgs> for L1Contracts {
    fn from(value: ContractsArgs) -> Self {
        Self::new(value.inbox, value.rollup)
    }
}

/// The arguments for the derivation.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct DerivationArgs {
    /// The L1 block the derivation starts after.
    #[arg(long = "derivation.start-l1-block", value_name = "NUMBER", env = "DERIVATION_START_L1_BLOCK")]
    pub start_l1_block: u64,
    /// The maximum number of attempts of a derivation step.
    #[arg(long = "derivation.max-attempts", default_value_t = constants::DEFAULT_DERIVATION_MAX_ATTEMPTS)]
    pub max_attempts: usize,
    /// The delay after the first failed derivation attempt, in milliseconds.
    #[arg(long = "derivation.initial-backoff", value_name = "MILLISECONDS", default_value_t = constants::DEFAULT_DERIVATION_INITIAL_BACKOFF)]
    pub initial_backoff: u64,
    /// Whether the delay between attempts doubles after each failure.
    #[arg(long = "derivation.exponential-backoff", default_value_t = true, action = ArgAction::Set)]
    pub exponential_backoff: bool,
    /// The wait between two derivation steps once caught up with the L1, in milliseconds.
    #[arg(long = "derivation.step-interval", value_name = "MILLISECONDS", default_value_t = constants::DEFAULT_DERIVATION_STEP_INTERVAL)]
    pub step_interval: u64,
}

impl DerivationArgs {
    /// Returns the [`DriverConfig`] of the derivation driver.
    pub const fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            retry: RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.initial_backoff),
                self.exponential_backoff,
            ),
            step_interval: Duration::from_millis(self.step_interval),
        }
    }
}

/// The arguments for the batcher.
#[derive(Debug, Clone, clap::Args)]
pub struct BatcherArgs {
    /// Whether the batcher should post the L2 blocks to the L1.
    #[arg(long = "batcher.enabled", default_value_t = false)]
    pub enabled: bool,
    /// The private key of the batcher account.
    #[arg(long = "batcher.private-key", value_name = "HEX", env = "BATCHER_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<PrivateKeySigner>,
    /// The soft limit on the size of a batch, in bytes.
    #[arg(long = "batcher.max-batch-size", value_name = "BYTES", default_value_t = constants::DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,
    /// The interval between two batch submissions, in seconds.
    #[arg(long = "batcher.submission-interval", value_name = "SECONDS", default_value_t = constants::DEFAULT_SUBMISSION_INTERVAL)]
    pub submission_interval: u64,
    /// The timeout waiting for a batch transaction receipt, in seconds.
    #[arg(long = "batcher.confirmation-timeout", value_name = "SECONDS", default_value_t = constants::DEFAULT_CONFIRMATION_TIMEOUT)]
    pub confirmation_timeout: u64,
}

impl BatcherArgs {
    /// Returns the [`BatcherConfig`] posting to the provided inbox.
    pub const fn batcher_config(&self, inbox_address: Address) -> BatcherConfig {
        BatcherConfig {
            inbox_address,
            max_batch_size: self.max_batch_size,
            submission_interval: Duration::from_secs(self.submission_interval),
        }
    }
}

/// The arguments for the logs.
#[derive(Debug, Clone, clap::Args)]
pub struct LogArgs {
    /// The log filter, overridden by `RUST_LOG`.
    #[arg(long = "log.filter", value_name = "FILTER", default_value = "info")]
    pub filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn parse(extra: &[&str]) -> Result<RollupNodeArgs, clap::Error> {
        let mut args = vec![
            "rollup-node",
            "--l1.rpc-url",
            "http://localhost:8545",
            "--l2.rpc-url",
            "http://localhost:9545",
            "--l2.engine-url",
            "http://localhost:9551",
            "--contracts.inbox",
            "0x1111111111111111111111111111111111111111",
            "--contracts.rollup",
            "0x2222222222222222222222222222222222222222",
            "--derivation.start-l1-block",
            "100",
        ];
        args.extend_from_slice(extra);
        RollupNodeArgs::try_parse_from(args)
    }

    #[test]
    fn test_parse_defaults() -> eyre::Result<()> {
        let args = parse(&[])?;

        assert_eq!(args.l1.syncer_config(), SyncerConfig::default());
        assert_eq!(args.derivation.driver_config(), DriverConfig::default());
        assert_eq!(args.derivation.start_l1_block, 100);
        assert_eq!(
            L1Contracts::from(args.contracts),
            L1Contracts::new(Address::repeat_byte(0x11), Address::repeat_byte(0x22))
        );
        assert_eq!(
            args.batcher.batcher_config(args.contracts.inbox),
            BatcherConfig { inbox_address: Address::repeat_byte(0x11), ..Default::default() }
        );
        assert_eq!(args.log.filter, "info");
        assert!(args.validate().is_ok());

        Ok(())
    }

    #[test]
    fn test_parse_derivation_retry() -> eyre::Result<()> {
        let args = parse(&[
            "--derivation.max-attempts",
            "3",
            "--derivation.initial-backoff",
            "50",
            "--derivation.exponential-backoff",
            "false",
        ])?;

        assert_eq!(args.derivation.driver_config().retry, RetryPolicy::new(3, Duration::from_millis(50), false));
        Ok(())
    }

    #[test]
    fn test_missing_required_argument_fails() {
        let err = RollupNodeArgs::try_parse_from(["rollup-node", "--l1.rpc-url", "http://localhost:8545"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_validate_batcher_requires_private_key() -> eyre::Result<()> {
        let args = parse(&["--batcher.enabled"])?;
        assert!(args.validate().unwrap_err().contains("A private key is required"));

        let args = parse(&["--batcher.enabled", "--batcher.private-key", KEY])?;
        assert!(args.validate().is_ok());

        Ok(())
    }
}
