//! Rollup node binary

use clap::Parser;
use rollup_node::{RollupNode, RollupNodeArgs};

#[tokio::main]
async fn main() {
    let args = RollupNodeArgs::parse();

    if let Err(err) = init_tracing_subscriber(&args.log.filter) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = RollupNode::new(args).run().await {
        tracing::error!(target: "rollup::node", ?err, "rollup node failed");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over the provided filter.
fn init_tracing_subscriber(filter: &str) -> eyre::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_ansi(true),
        )
        .with(filter)
        .init();
    Ok(())
}
