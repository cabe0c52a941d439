//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and the ledger metrics, and an async HTTP exporter that serves
//! `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use prometheus::{
    self, Counter, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::consensus::EpochSummary;

/// Ledger Prometheus metrics.
///
/// Registered into a [`Registry`] and updated by whoever drives validation
/// and epochs (the node binary or the gateway).
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Latency of whole-transaction validation, in seconds.
    pub tx_validation_seconds: Histogram,
    pub tx_accepted: IntCounter,
    pub tx_rejected: IntCounter,
    /// Input signatures that failed to verify, tolerated or not.
    pub signature_failures: IntCounter,
    pub rsc_rounds: IntCounter,
    /// Nodes ranked in the latest round.
    pub active_nodes: IntGauge,
    /// Sum of voluntary tips paid out to ranked nodes.
    pub tips_distributed: Counter,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        // Signature verification dominates; buckets start in the sub-ms range.
        let tx_validation_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "tx_validation_seconds",
                "Time to validate a transaction (structure + signatures) in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0,
            ]),
        )?;
        registry.register(Box::new(tx_validation_seconds.clone()))?;

        let tx_accepted = IntCounter::with_opts(Opts::new(
            "tx_accepted_total",
            "Transactions that passed validation",
        ))?;
        registry.register(Box::new(tx_accepted.clone()))?;

        let tx_rejected = IntCounter::with_opts(Opts::new(
            "tx_rejected_total",
            "Transactions that failed validation",
        ))?;
        registry.register(Box::new(tx_rejected.clone()))?;

        let signature_failures = IntCounter::with_opts(Opts::new(
            "tx_signature_failures_total",
            "Input signatures that failed to verify",
        ))?;
        registry.register(Box::new(signature_failures.clone()))?;

        let rsc_rounds = IntCounter::with_opts(Opts::new(
            "rsc_rounds_total",
            "Completed Rapid Stake Consensus rounds",
        ))?;
        registry.register(Box::new(rsc_rounds.clone()))?;

        let active_nodes = IntGauge::with_opts(Opts::new(
            "rsc_active_nodes",
            "Nodes ranked in the latest round",
        ))?;
        registry.register(Box::new(active_nodes.clone()))?;

        let tips_distributed = Counter::with_opts(Opts::new(
            "rsc_tips_distributed_total",
            "Voluntary tips paid out to ranked nodes",
        ))?;
        registry.register(Box::new(tips_distributed.clone()))?;

        Ok(Self {
            tx_validation_seconds,
            tx_accepted,
            tx_rejected,
            signature_failures,
            rsc_rounds,
            active_nodes,
            tips_distributed,
        })
    }

    /// Records one validation outcome.
    pub fn observe_validation(&self, elapsed: Duration, accepted: bool, signature_failures: usize) {
        self.tx_validation_seconds.observe(elapsed.as_secs_f64());
        if accepted {
            self.tx_accepted.inc();
        } else {
            self.tx_rejected.inc();
        }
        self.signature_failures.inc_by(signature_failures as u64);
    }

    /// Records a completed RSC round.
    pub fn observe_epoch(&self, summary: &EpochSummary) {
        self.rsc_rounds.inc();
        self.active_nodes.set(summary.ranked as i64);
        self.tips_distributed.inc_by(summary.distributed);
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the ledger metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// Intended to be spawned onto a Tokio runtime:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9898".parse()?;
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "metrics scrape connection");
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                warn!(error = %err, "prometheus HTTP server error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut response = Response::new(Full::new(Bytes::from(metrics.gather_text())));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        _ => {
            let mut response = Response::new(Full::new(Bytes::from("not found")));
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    };
    Ok(response)
}
