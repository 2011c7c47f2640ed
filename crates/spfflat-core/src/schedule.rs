//! Provider grouping and the bounded worker pool.
//!
//! Domains sharing a provider share one token bucket; distinct providers
//! run fully parallel. A counting semaphore caps total in-flight tasks
//! independent of grouping, and results flow back through an mpsc
//! channel in completion order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::limiter::RateLimiter;
use crate::task::DomainTask;

/// Default cap on concurrently processed domains.
pub const DEFAULT_WORKER_LIMIT: usize = 5;

/// Domains grouped under one provider tag, sharing a rate limiter.
pub struct ProviderGroup {
    pub provider: String,
    pub tasks: Vec<DomainTask>,
    pub limiter: Arc<RateLimiter>,
}

/// Group tasks by provider tag (case-insensitive). Each group gets its
/// own token bucket at the cross-component default rate.
pub fn group_by_provider(tasks: Vec<DomainTask>) -> HashMap<String, ProviderGroup> {
    let mut groups: HashMap<String, ProviderGroup> = HashMap::new();
    for task in tasks {
        let key = task.provider.to_lowercase();
        groups
            .entry(key.clone())
            .or_insert_with(|| ProviderGroup {
                provider: key,
                tasks: Vec::new(),
                limiter: Arc::new(RateLimiter::provider_default()),
            })
            .tasks
            .push(task);
    }
    groups
}

/// Run `futures` with at most `limit` in flight; results are returned in
/// completion order, after the full join.
pub async fn run_bounded<T, Fut>(limit: usize, futures: Vec<Fut>) -> Vec<T>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let (tx, mut rx) = mpsc::channel(futures.len().max(1));

    let total = futures.len();
    for future in futures {
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        tokio::spawn(async move {
            // The semaphore lives as long as every spawned task.
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            let _ = tx.send(future.await).await;
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(total);
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}
