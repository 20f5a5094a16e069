//! Catalog Cache - demonstration binary
//!
//! Runs a small privacy-pattern catalog workload against the cache and prints
//! the resulting statistics as JSON.

use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_cache::invalidation::entity_key;
use catalog_cache::{memoize, spawn_cleanup_task, Cache, Config, Invalidator, MemoizeOptions};

const PATTERNS: &[(u32, &str, &str)] = &[
    (1, "Minimize", "Limit collected data to what the purpose requires"),
    (2, "Hide", "Keep personal data out of plain view"),
    (3, "Separate", "Process personal data in isolated compartments"),
    (4, "Inform", "Tell data subjects how their data is processed"),
];

const PAGE_SIZE: usize = 2;

/// Main entry point for the cache demonstration.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the cache and start the background TTL cleanup task
/// 4. Serve pattern lookups and listings, update one pattern, serve again
/// 5. Print statistics and stop the cleanup task
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate().context("invalid cache configuration")?;
    info!(
        "Configuration loaded: max_size={}, default_ttl={}s, cleanup_interval={}s",
        config.max_size, config.default_ttl, config.cleanup_interval
    );

    let cache: Cache<Value> = Cache::from_config(&config);
    let cleanup = spawn_cleanup_task(cache.clone(), config.cleanup_interval_duration());

    let list_patterns = memoize(
        &cache,
        MemoizeOptions::new()
            .namespace("pattern_list")
            .ttl(Duration::from_secs(120)),
        |page: usize| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let names: Vec<&str> = PATTERNS
                .iter()
                .skip(page * PAGE_SIZE)
                .take(PAGE_SIZE)
                .map(|(_, name, _)| *name)
                .collect();
            json!(names)
        },
    );

    let mut invalidator = Invalidator::new(&cache);
    invalidator.register_namespace("pattern_list");

    for round in 0..3 {
        for id in [1, 2, 3] {
            let pattern = pattern_detail(&cache, id).await;
            info!(round, %pattern, "served pattern");
        }
        let page = list_patterns.call_async(0).await;
        info!(round, %page, "served listing");
    }

    // An edit to pattern 1 makes its detail and every listing stale
    let removed = invalidator.invalidate_entity_cache(1);
    info!(removed, "pattern 1 updated");
    pattern_detail(&cache, 1).await;
    list_patterns.call_async(0).await;

    let stats = serde_json::to_string_pretty(&cache.stats())?;
    println!("{}", stats);

    cleanup.shutdown().await?;
    info!("Shutdown complete");
    Ok(())
}

/// Reads a pattern through the cache, loading it on a miss.
async fn pattern_detail(cache: &Cache<Value>, id: u32) -> Value {
    let key = format!("pattern:{}", entity_key(id));
    if let Some(pattern) = cache.get(&key) {
        return pattern;
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    let pattern = PATTERNS
        .iter()
        .find(|(pattern_id, _, _)| *pattern_id == id)
        .map(|(id, name, summary)| json!({ "id": id, "name": name, "summary": summary }))
        .unwrap_or(Value::Null);
    cache.set(key, pattern.clone(), None);
    pattern
}
