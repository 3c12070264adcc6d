//! End to end derivation scenarios over mocked L1, L2 and execution clients.

use std::{collections::HashMap, sync::Arc, time::Duration};

use alloy_primitives::{address, Address, Bytes, B256};
use rollup_codec::BatchPayload;
use rollup_derivation_pipeline::{
    create_pipeline, DerivationPipeline, Driver, DriverConfig, ErrorKind, PipelineConfig,
    RetryPolicy, Stage, StepOutcome,
};
use rollup_engine::test_utils::MockExecutionBackend;
use rollup_l1::L1Contracts;
use rollup_node_primitives::{BlockInfo, BlockRef, BlockTag, DerivationBlock, L1Block, L1Transaction};
use rollup_node_providers::test_utils::{chain, chain_from, MockL1Provider, MockL2Provider};
use rollup_node_watcher::L1State;

const INBOX: Address = address!("0x1000000000000000000000000000000000000001");
const ROLLUP: Address = address!("0x2000000000000000000000000000000000000002");

type Pipeline = DerivationPipeline<MockL1Provider, MockExecutionBackend, MockL2Provider>;

struct Harness {
    driver: Driver<Pipeline, MockL1Provider>,
    l1: MockL1Provider,
    l2: MockL2Provider,
    backend: MockExecutionBackend,
    l1_state: Arc<L1State>,
    headers: Vec<BlockRef>,
}

fn append_batch(numbers: impl IntoIterator<Item = u64>) -> L1Transaction {
    let blocks = numbers
        .into_iter()
        .map(|n| DerivationBlock::new(n, 1_000 + n, vec![Bytes::from(vec![n as u8; 4])]))
        .collect();
    let input = BatchPayload::new(blocks).to_calldata().expect("non empty batch");
    L1Transaction { hash: B256::random(), to: Some(INBOX), input }
}

fn l1_blocks(
    headers: &[BlockRef],
    mut transactions: HashMap<u64, Vec<L1Transaction>>,
) -> Vec<L1Block> {
    headers
        .iter()
        .map(|h| L1Block {
            block_ref: *h,
            transactions: transactions.remove(&h.number).unwrap_or_default(),
        })
        .collect()
}

/// Outputs the logs of the test when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sets up an L1 chain up to `l1_head`, with the derivation starting after L1 block #99 and
/// the L2 chain at `l2_head`.
fn harness(l1_head: u64, l2_head: u64, transactions: HashMap<u64, Vec<L1Transaction>>) -> Harness {
    init_tracing();

    let headers = chain(l1_head as usize + 1);
    let l1 = MockL1Provider::new(l1_blocks(&headers, transactions));

    let l2 = MockL2Provider::new();
    for n in 1..=l2_head {
        l2.build_block(n, 1_000 + n, vec![]);
    }
    let backend = MockExecutionBackend::new(l2.clone());
    let l1_state = Arc::new(L1State::new());

    let config = PipelineConfig {
        start_l1_block: headers[99].info(),
        contracts: L1Contracts::new(INBOX, ROLLUP),
    };
    let pipeline =
        create_pipeline(config, l1.clone(), backend.clone(), l2.clone(), l1_state.clone());
    let driver_config = DriverConfig {
        retry: RetryPolicy::new(5, Duration::from_millis(1), false),
        step_interval: Duration::from_millis(1),
    };
    let driver = Driver::new(pipeline, l1.clone(), driver_config);

    Harness { driver, l1, l2, backend, l1_state, headers }
}

fn l2_info(l2: &MockL2Provider, number: u64) -> BlockInfo {
    l2.block(number).map(|b| b.block_ref.info()).unwrap_or_default()
}

fn relation_l1_numbers(pipeline: &Pipeline) -> Vec<u64> {
    pipeline.relations().as_slice().iter().map(|r| r.l1_block.number).collect()
}

#[tokio::test]
async fn test_derives_batch_and_updates_safe_block() -> eyre::Result<()> {
    let transactions = HashMap::from([(102, vec![append_batch([50, 51])])]);
    let Harness { mut driver, l2, backend, l1_state, headers, .. } = harness(103, 49, transactions);

    // L1 blocks #100 to #102.
    for _ in 100..=102 {
        assert!(matches!(driver.step().await?, StepOutcome::Progress(_)));
    }
    let built: Vec<_> = backend.built().iter().map(|b| b.number).collect();
    assert_eq!(built, vec![50, 51]);

    let relations = driver.pipeline().relations();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations.as_slice()[0].l1_block, headers[102].info());
    assert_eq!(relations.as_slice()[0].l2_block, l2_info(&l2, 51));
    assert_eq!(relations.mark_safe(102), l2_info(&l2, 51));
    assert!(backend.forkchoice_updates().is_empty());

    // the L1 safe block reaches #102, processing #103 moves the L2 safe block.
    l1_state.update_safe(headers[102].info())?;
    assert!(matches!(driver.step().await?, StepOutcome::Progress(_)));

    let updates = backend.forkchoice_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].get_alloy_fcs().safe_block_hash, l2_info(&l2, 51).hash);

    assert_eq!(driver.step().await?, StepOutcome::Idle);
    assert_eq!(backend.forkchoice_updates().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_reorg_discards_relations_past_rollback() -> eyre::Result<()> {
    let transactions = HashMap::from([
        (101, vec![append_batch([1])]),
        (103, vec![append_batch([2])]),
        (105, vec![append_batch([3])]),
    ]);
    let Harness { mut driver, l1, headers, .. } = harness(105, 0, transactions);
    for _ in 100..=105 {
        driver.step().await?;
    }
    assert_eq!(relation_l1_numbers(driver.pipeline()), vec![101, 103, 105]);

    // the chain is reorged from #103.
    let fork = chain_from(&headers[102], 4);
    l1.insert_blocks(l1_blocks(&fork, HashMap::new()));

    let mut pipeline = driver.into_pipeline();
    let err = pipeline.pull().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Recoverable);

    pipeline.recover(headers[103].info()).await;
    assert_eq!(relation_l1_numbers(&pipeline), vec![101, 103]);
    Ok(())
}

#[tokio::test]
async fn test_driver_recovers_from_reorg_to_l1_safe_block() -> eyre::Result<()> {
    let transactions = HashMap::from([
        (101, vec![append_batch([1])]),
        (103, vec![append_batch([2])]),
        (105, vec![append_batch([3])]),
    ]);
    let Harness { mut driver, l1, backend, headers, .. } = harness(105, 0, transactions);
    for _ in 100..=105 {
        driver.step().await?;
    }

    let fork = chain_from(&headers[102], 4);
    l1.insert_blocks(l1_blocks(&fork, HashMap::new()));
    l1.set_tag(BlockTag::Safe, 102);

    // the reorg is detected at #106, the pipeline restarts after the safe block #102.
    assert!(matches!(driver.step().await?, StepOutcome::Progress(_)));
    assert_eq!(relation_l1_numbers(driver.pipeline()), vec![101]);

    for _ in 104..=106 {
        assert!(matches!(driver.step().await?, StepOutcome::Progress(_)));
    }
    assert_eq!(driver.step().await?, StepOutcome::Idle);

    // the L2 blocks were not built again.
    assert_eq!(backend.built().len(), 3);
    Ok(())
}
