use crate::model::branch::Branch;
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

/// Branch geofences change rarely but are read on every geofenced punch, so
/// resolved entries are held in-memory with a TTL.
pub static BRANCH_CACHE: Lazy<Cache<String, Branch>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000) // tune based on branch count
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

/// Cache a resolved branch geofence
pub async fn put(branch: Branch) {
    BRANCH_CACHE
        .insert(branch.name.to_lowercase(), branch)
        .await;
}

/// Look up a branch by name, if cached
pub async fn get(name: &str) -> Option<Branch> {
    BRANCH_CACHE.get(&name.to_lowercase()).await
}

/// Drop a branch entry after an admin updates its geofence
pub async fn invalidate(name: &str) {
    BRANCH_CACHE.invalidate(&name.to_lowercase()).await;
}
