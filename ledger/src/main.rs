// src/main.rs
//
// Demo node that wires up the ledger library:
//
// - Prometheus metrics exporter on /metrics
// - structural + signature validation into a tip pool
// - an RSC engine over a handful of simulated validator nodes
// - a loop that, every epoch, admits a few signed transactions, feeds the
//   nodes simulated responses and distributes the pooled tips.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledger::{
    KeyedDigestScheme, Keypair, LedgerConfig, MetricsRegistry, NodeId, NodeStake, PUBLIC_KEY_LEN,
    PublicKey, RscEngine, Transaction, TransactionValidator, TxError, TxHash, TxPool,
    ValidationContext, run_prometheus_http_server,
};

const DEMO_NODES: [(&str, f64); 5] = [
    ("validator-a", 5_000.0),
    ("validator-b", 2_500.0),
    ("validator-c", 1_200.0),
    ("validator-d", 800.0),
    ("validator-e", 50.0),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledger=info")),
        )
        .init();

    if let Err(err) = run_node().await {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run_node() -> Result<(), String> {
    let cfg = LedgerConfig::load().map_err(|e| format!("failed to load config: {e}"))?;

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                warn!(error = %e, "metrics HTTP server error");
            }
        });
        info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Validation + pool
    // ---------------------------

    let scheme = KeyedDigestScheme;
    let validator = TransactionValidator::new(&cfg.tx, scheme);
    let ctx = ValidationContext::initialized();
    let mut pool = TxPool::new(cfg.pool);

    // ---------------------------
    // RSC engine + demo nodes
    // ---------------------------

    let mut engine = RscEngine::new(cfg.rsc.clone());
    for (name, stake) in DEMO_NODES {
        let id = NodeId::new(name).ok_or_else(|| format!("invalid node id {name:?}"))?;
        let keys = scheme.generate_keypair();
        engine
            .register_node(NodeStake::new(id, keys.public, stake))
            .map_err(|e| format!("failed to register {name}: {e}"))?;
    }

    let sender = scheme.generate_keypair();
    let interval = cfg.epoch_interval();
    info!(
        epoch_secs = interval.as_secs(),
        nodes = engine.nodes().len(),
        "starting demo node"
    );

    // ---------------------------
    // Epoch loop
    // ---------------------------

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }

        for _ in 0..3 {
            let start = Instant::now();
            let tx = match demo_transaction(&scheme, &sender) {
                Ok(tx) => tx,
                Err(e) => {
                    warn!(error = %e, "failed to build demo transaction");
                    continue;
                }
            };
            match validator.validate(&ctx, &tx) {
                Ok(report) => {
                    metrics.ledger.observe_validation(
                        start.elapsed(),
                        true,
                        report.signature_failures,
                    );
                    if let Err(e) = pool.insert_validated(tx, report) {
                        warn!(error = %e, "transaction not pooled");
                    }
                }
                Err(e) => {
                    metrics
                        .ledger
                        .observe_validation(start.elapsed(), false, 0);
                    warn!(error = %e, "demo transaction rejected");
                }
            }
        }

        simulate_responses(&mut engine);

        let tips = pool.take_tips();
        match engine.run_epoch(tips) {
            Ok(summary) => {
                metrics.ledger.observe_epoch(&summary);
                pool.credit_tips(summary.undistributed);
                for entry in engine.rapid_table().entries() {
                    let share = engine.nodes()[entry.index].metrics.tip_share;
                    info!(
                        rank = entry.rank,
                        node = %entry.node_id,
                        score = entry.score,
                        tip_share = share,
                        "rapid table"
                    );
                }
            }
            Err(e) => {
                pool.credit_tips(tips);
                warn!(error = %e, "rsc epoch failed");
            }
        }

        // Transactions have paid their tips; make room for the next epoch.
        pool.drain(pool.len());
    }

    Ok(())
}

/// Builds a signed transfer with a random tip.
fn demo_transaction(scheme: &KeyedDigestScheme, sender: &Keypair) -> Result<Transaction, TxError> {
    let mut rng = rand::rng();
    let mut prev = [0u8; 64];
    rng.fill(&mut prev[..]);

    let mut tx = Transaction::new();
    tx.add_input(&TxHash(prev), 0, &sender.public)?;
    tx.add_output(
        &PublicKey([0x42; PUBLIC_KEY_LEN]),
        rng.random_range(1.0..100.0),
    )?;
    tx.set_voluntary_tip(rng.random_range(0.0..2.0))?;
    tx.timestamp = current_unix_millis();
    tx.sign_input(0, &sender.private, scheme)?;
    Ok(tx)
}

/// Feeds every node a burst of simulated responses; lower stake nodes are
/// slower and flakier.
fn simulate_responses(engine: &mut RscEngine) {
    let mut rng = rand::rng();
    let now = current_unix_millis();
    let ids: Vec<NodeId> = engine.nodes().iter().map(|n| n.node_id.clone()).collect();

    for (i, id) in ids.iter().enumerate() {
        let Some(node) = engine.node_mut(id) else {
            continue;
        };
        let base_latency = 80 + 150 * i as u64;
        let success_rate = 0.98 - 0.15 * i as f64;
        for _ in 0..rng.random_range(1..6) {
            let latency = base_latency + rng.random_range(0..120);
            let success = rng.random_bool(success_rate.clamp(0.0, 1.0));
            node.metrics.record_response(latency, success, now);
        }
    }
}

/// Returns the current wall-clock time as milliseconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 1, so the
/// timestamp still counts as set.
fn current_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_millis(1))
        .as_millis() as u64
}
