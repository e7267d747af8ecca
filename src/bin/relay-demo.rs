//! A minimal statsd relay built on [`adaptive_statsd_sampler::SyncEngine`].
//!
//! Listens for newline-delimited statsd lines on a TCP socket, feeds each
//! line through the engine, and forwards whatever it returns (raw
//! passthrough lines, or the aggregated replacement lines from a
//! periodic flush) to stdout in place of an actual upstream statsd
//! backend. Illustrative only — not part of the crate's public API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

use adaptive_statsd_sampler::{EngineConfig, SyncEngine};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = EngineConfig::default();
    let engine = Arc::new(SyncEngine::new(config).expect("default config is always valid"));

    let addr: SocketAddr = "0.0.0.0:8125".parse().expect("valid socket address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind relay listener");
    tracing::info!(%addr, window_secs = config.window_secs, "relay listening");

    let flush_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.window_secs));
        loop {
            ticker.tick().await;
            let mut emitted = 0usize;
            flush_engine.flush(|_key, line| {
                println!("{line}");
                emitted += 1;
            });
            tracing::debug!(emitted, "flush tick");
        }
    });

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(%err, "accept failed");
                continue;
            }
        };
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            tracing::debug!(%peer, "connection opened");
            let mut lines = BufReader::new(socket).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match engine.consider(&line) {
                        Ok(adaptive_statsd_sampler::SamplingResult::NotSampling) => {
                            println!("{line}");
                        }
                        Ok(adaptive_statsd_sampler::SamplingResult::Sampling) => {}
                        Err(err) => tracing::warn!(%err, %line, "rejected line"),
                    },
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(%err, %peer, "read error");
                        break;
                    }
                }
            }
            tracing::debug!(%peer, "connection closed");
        });
    }
}
