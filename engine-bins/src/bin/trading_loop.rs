//! Entry point: loads config, wires the shared risk/cost/monitoring state,
//! spawns one market-data task and one trading loop per symbol against a
//! simulated venue, and shuts down cleanly on Ctrl+C.

use anyhow::Result;
use clap::Parser;
use engine_bins::adapters::{DryRunAdapter, SimulatedAdapter};
use engine_bins::common::{load_config, CommonArgs};
use engine_core::attribution::PnLAttributor;
use engine_core::cost::{DynamicCostEstimator, SlippageEstimator};
use engine_core::data::{ExchangeAdapter, MarketDataHub};
use engine_core::engine::{SizingConfig, TradingLoop};
use engine_core::execution::{ExecutionConfig, ExecutionStrategy, HybridExecutor, IocExecutor, ShallowMakerExecutor};
use engine_core::monitoring::{FillRateMonitor, MetricsRegistry};
use engine_core::risk::{PositionManager, RiskGate, RiskGateConfig, RiskState};
use engine_core::signals::{Classifier, SignalAggregator};
use engine_core::utils::init_logger;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    let config = load_config(&args)?;

    if args.check_config {
        println!("config OK: {} symbol(s), strategy={}", config.symbols.len(), config.execution.strategy);
        return Ok(());
    }

    init_logger(&config.logging.level, config.logging.json);

    tokio::runtime::Builder::new_multi_thread().enable_all().build()?.block_on(run(args, config))
}

async fn run(args: CommonArgs, config: engine_core::config::Config) -> Result<()> {
    info!(symbols = ?config.symbols, strategy = %config.execution.strategy, dry_run = args.dry_run, "starting trading loop");

    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("received Ctrl+C, shutting down");
        cancel_ctrlc.cancel();
    })?;

    let venue = SimulatedAdapter::new();
    let adapter: Arc<dyn ExchangeAdapter> = if args.dry_run {
        DryRunAdapter::new(venue) as Arc<dyn ExchangeAdapter>
    } else {
        venue as Arc<dyn ExchangeAdapter>
    };

    let hub = Arc::new(MarketDataHub::new(adapter.clone(), 10, 2_000));

    let risk_state = RiskState::new(dec!(1_000_000));
    let risk_gate = Arc::new(RiskGate::new(
        RiskGateConfig {
            max_position_usd: config.risk.max_position_usd,
            max_single_loss_pct: config.risk.max_single_loss_pct,
            max_daily_drawdown_pct: config.risk.max_daily_drawdown_pct,
            worst_adverse_move_bps: config.risk.worst_adverse_move_bps,
        },
        risk_state,
    ));
    let positions = PositionManager::new();

    let slippage = SlippageEstimator::new(500, 2.0);
    let cost_estimator = Arc::new(DynamicCostEstimator::new(
        config.cost.maker_fee_bps,
        config.cost.taker_fee_bps,
        0.1,
        0.5,
        slippage,
    ));

    let fill_rate = Arc::new(FillRateMonitor::new(config.monitoring.fill_rate.window_size));
    let attributor = Arc::new(PnLAttributor::new(config.cost.maker_fee_bps, config.cost.taker_fee_bps));
    let metrics = Arc::new(MetricsRegistry::new()?);

    let strategy = if config.execution.strategy == "ioc_only" {
        ExecutionStrategy::IocOnly
    } else {
        ExecutionStrategy::Hybrid
    };
    let execution_config = ExecutionConfig {
        strategy,
        fallback_on_high: config.execution.ioc.fallback_on_high,
        fallback_on_medium: config.execution.ioc.fallback_on_medium,
    };

    let mut tasks = Vec::new();

    for symbol in &config.symbols {
        let tick = rust_decimal::Decimal::from(config.execution.shallow_maker.tick_offset) * dec!(0.01);
        let maker = ShallowMakerExecutor::new(
            adapter.clone(),
            tick,
            std::time::Duration::from_secs(config.execution.shallow_maker.timeout_high_secs),
            std::time::Duration::from_secs(config.execution.shallow_maker.timeout_medium_secs),
            config.execution.shallow_maker.post_only,
        );
        let ioc = IocExecutor::new(adapter.clone(), dec!(50));
        let executor = Arc::new(HybridExecutor::new(adapter.clone(), maker, ioc, execution_config));

        let aggregator = SignalAggregator::new(config.signals.weights);
        let classifier = Classifier::new(config.signals.thresholds.theta_1, config.signals.thresholds.theta_2);
        let sizing = SizingConfig { base_size: dec!(1), k: 1.0 };

        let trading_loop = TradingLoop::new(
            symbol.clone(),
            hub.clone(),
            aggregator,
            classifier,
            sizing,
            risk_gate.clone(),
            executor,
            positions.clone(),
            cost_estimator.clone(),
            fill_rate.clone(),
            attributor.clone(),
            metrics.clone(),
            2_000,
        );

        let hub_for_feed = hub.clone();
        let symbol_for_feed = symbol.clone();
        let cancel_for_feed = cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = hub_for_feed.run_symbol(&symbol_for_feed, cancel_for_feed).await {
                warn!(symbol = %symbol_for_feed, error = %e, "market data task ended with error");
            }
        }));

        let cancel_for_loop = cancel.clone();
        tasks.push(tokio::spawn(async move {
            trading_loop.run(cancel_for_loop).await;
        }));
    }

    for task in tasks {
        let _ = task.await;
    }

    info!(
        fill_rate_high = ?fill_rate.fill_rate(engine_core::signals::Confidence::High),
        alpha_share = ?attributor.alpha_share(),
        "shutdown complete"
    );

    Ok(())
}
