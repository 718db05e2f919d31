//! Prometheus metrics for report generation.
//!
//! Exposes:
//! - `chat_report_generation_duration_seconds` (histogram)
//! - `chat_report_generation_total` (counter with status)
//! - `chat_report_generation_inflight` (gauge)
//! - `chat_report_chats_processed_total` (counter)
//! - process metrics via `process` collector

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge_vec, Encoder, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
    TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 10ms up to ~80s.
    let buckets =
        prometheus::exponential_buckets(0.01, 2.0, 14).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "chat_report_generation_duration_seconds",
        "Report generation duration in seconds",
        &["source"],
        buckets
    )
    .expect("failed to register generation duration histogram")
});

static GENERATION_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chat_report_generation_total",
        "Total report generations by status",
        &["source", "status"]
    )
    .expect("failed to register generation counter")
});

static GENERATION_INFLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "chat_report_generation_inflight",
        "Number of in-flight report generations",
        &["source"]
    )
    .expect("failed to register inflight gauge")
});

static CHATS_PROCESSED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "chat_report_chats_processed_total",
        "Transcript rows loaded across all reports"
    )
    .expect("failed to register chats counter")
});

/// Ensure collectors are registered.
fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&GENERATION_DURATION);
    Lazy::force(&GENERATION_TOTAL);
    Lazy::force(&GENERATION_INFLIGHT);
    Lazy::force(&CHATS_PROCESSED);
}

/// Increment inflight gauge for a generation source (`cli`, `upload`).
pub fn record_report_start(source: &'static str) {
    init_collectors();
    GENERATION_INFLIGHT.with_label_values(&[source]).inc();
}

/// Record generation completion with duration and status.
pub fn record_report_result(source: &'static str, duration: Duration, success: bool) {
    init_collectors();
    GENERATION_INFLIGHT.with_label_values(&[source]).dec();
    GENERATION_DURATION
        .with_label_values(&[source])
        .observe(duration.as_secs_f64());
    GENERATION_TOTAL
        .with_label_values(&[source, if success { "ok" } else { "error" }])
        .inc();
}

pub fn record_chats_processed(rows: usize) {
    init_collectors();
    CHATS_PROCESSED.inc_by(rows as u64);
}

async fn metrics_response() -> Result<Response<Full<Bytes>>, Infallible> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", err);
        let mut response = Response::new(Full::from("encode error"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return Ok(response);
    }

    let mut response = Response::new(Full::from(buffer));
    if let Ok(content_type) = encoder.format_type().parse() {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}

async fn handle_request(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => metrics_response().await,
        _ => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::NOT_FOUND;
            Ok(response)
        }
    }
}

async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Prometheus metrics endpoint started");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service_fn(handle_request);
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "Metrics connection error: {}", err);
            }
        });
    }
}

/// Spawn the metrics HTTP endpoint on the given address.
pub fn spawn_metrics_server(addr: SocketAddr) {
    init_collectors();
    tokio::spawn(async move {
        if let Err(err) = serve(addr).await {
            error!(%addr, "Metrics server failed: {}", err);
        }
    });
}
