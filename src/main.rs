use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use tick_order::exchanges::PaperOrderService;
use tick_order::feeds::{read_ticks, run_feed};
use tick_order::{Config, Order, TickHandler};

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    // Config picks the default log level, so it is read before the logger
    // exists. RUST_LOG still wins; a bad config is reported after init.
    let config = Config::load_or_default(&config_path);
    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tick_order=debug", level)));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    let config = config?;
    tracing::info!("🦀 tick-order starting (threshold {})", config.order.price_threshold);

    let venue = Arc::new(if config.paper.fail_buys {
        PaperOrderService::rejecting()
    } else {
        PaperOrderService::new()
    });

    let order = Arc::new(Order::new(venue.clone(), config.order.price_threshold)?);
    order.on_placed(|e| {
        tracing::info!("📈 PLACED {} @ {} (order {})", e.code, e.price, e.order_id);
    });
    order.on_errored(|e| {
        tracing::error!("💥 ERRORED {} @ {} (order {}): {}", e.code, e.price, e.order_id, e.error);
    });

    let handler: Arc<dyn TickHandler> = order.clone();
    let stats = match &config.feed.path {
        Some(path) => {
            tracing::info!("📡 Reading ticks from {}", path.display());
            let file = File::open(path)?;
            run_feed(handler, read_ticks(BufReader::new(file)), config.feed.workers)
        }
        None => {
            tracing::info!("📡 Reading ticks from stdin");
            run_feed(handler, read_ticks(io::stdin().lock()), config.feed.workers)
        }
    };

    tracing::info!(
        "Feed done: {} delivered, {} rejected, {} failed, {} undecodable",
        stats.delivered,
        stats.rejected,
        stats.failed,
        stats.undecodable
    );
    println!(
        "order {} finished {} ({} venue calls, {} fills)",
        order.id(),
        order.state(),
        venue.attempts(),
        venue.fills().len()
    );
    Ok(())
}
