use crate::RollupNodeArgs;
use std::{sync::Arc, time::Duration};

use alloy_network::EthereumWallet;
use alloy_provider::{ProviderBuilder, RootProvider};
use eyre::{eyre, WrapErr};
use rollup_derivation_pipeline::{create_pipeline, Driver, PipelineConfig};
use rollup_engine::RpcExecutionBackend;
use rollup_node_batcher::{BatchDisseminator, BatcherError};
use rollup_node_providers::{
    AlloyL1Provider, AlloyTxManager, HttpL2Dialer, L1Provider, L2Dialer, L2Provider, TxManager,
};
use rollup_node_watcher::{EthSyncer, L1State, SyncerError};

/// The rollup node service.
///
/// Runs the L1 header syncer, the derivation driver and, if enabled, the batch disseminator,
/// until Ctrl-C or the first fatal failure of one of them.
#[derive(Debug)]
pub struct RollupNode {
    args: RollupNodeArgs,
}

impl RollupNode {
    /// Returns a new [`RollupNode`].
    pub const fn new(args: RollupNodeArgs) -> Self {
        Self { args }
    }

    /// Launches the services and waits for them to exit.
    pub async fn run(self) -> eyre::Result<()> {
        let args = self.args;
        args.validate().map_err(|err| eyre!(err))?;

        let l1_rpc: RootProvider =
            RootProvider::connect(&args.l1.rpc_url).await.wrap_err("failed to connect to the L1")?;
        let l1 = AlloyL1Provider::new(l1_rpc);
        let start = l1
            .header_by_number(args.derivation.start_l1_block)
            .await?
            .ok_or_else(|| eyre!("missing start L1 block #{}", args.derivation.start_l1_block))?;

        let l1_state = Arc::new(L1State::new());
        let mut syncer = EthSyncer::new(args.l1.syncer_config());
        syncer.start(l1.clone(), l1_state.clone());

        let engine: RootProvider = RootProvider::connect(&args.l2.engine_url)
            .await
            .wrap_err("failed to connect to the L2 engine")?;
        let backend = Arc::new(RpcExecutionBackend::new(engine, args.l2.fee_recipient));
        let dialer = HttpL2Dialer::new(args.l2.rpc_url.clone());

        let config = PipelineConfig { start_l1_block: start.info(), contracts: args.contracts.into() };
        let pipeline = create_pipeline(config, l1.clone(), backend, dialer.clone(), l1_state);
        let mut driver = Driver::new(pipeline, l1, args.derivation.driver_config());
        tracing::info!(target: "rollup::node", start = %start, "started derivation");

        let disseminator = match (&args.batcher.private_key, args.batcher.enabled) {
            (Some(signer), true) => {
                let wallet = EthereumWallet::from(signer.clone());
                let provider = ProviderBuilder::new()
                    .wallet(wallet)
                    .connect(&args.l1.rpc_url)
                    .await
                    .wrap_err("failed to connect the batcher to the L1")?;
                let tx_manager = AlloyTxManager::new(
                    provider,
                    Duration::from_secs(args.batcher.confirmation_timeout),
                );
                let l2 = dialer.dial().await?;
                tracing::info!(target: "rollup::node", address = %signer.address(), "started batcher");
                Some(BatchDisseminator::new(
                    args.batcher.batcher_config(args.contracts.inbox),
                    l2,
                    tx_manager,
                ))
            }
            _ => None,
        };
        let batcher = run_batcher(disseminator);
        tokio::pin!(batcher);

        let result = tokio::select! {
            res = tokio::signal::ctrl_c() => {
                tracing::info!(target: "rollup::node", "received ctrl-c, shutting down");
                res.wrap_err("failed to listen for ctrl-c")
            }
            err = next_syncer_error(&mut syncer) => Err::<(), _>(err).wrap_err("L1 syncer failed"),
            res = driver.run() => res.wrap_err("derivation driver failed"),
            res = &mut batcher => res.wrap_err("batcher failed"),
        };

        syncer.stop().await;
        result
    }
}

/// Runs the disseminator if any, never returns otherwise.
async fn run_batcher<P, T>(disseminator: Option<BatchDisseminator<P, T>>) -> Result<(), BatcherError>
where
    P: L2Provider,
    T: TxManager,
{
    match disseminator {
        Some(disseminator) => disseminator.run().await,
        None => std::future::pending().await,
    }
}

/// Returns the first syncer failure. Never returns if all the syncer tasks exit cleanly.
async fn next_syncer_error(syncer: &mut EthSyncer) -> SyncerError {
    match syncer.next_error().await {
        Some(err) => err,
        None => std::future::pending().await,
    }
}
