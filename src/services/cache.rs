use crate::models::MatchConfig;
use std::time::Duration;

/// In-process cache of per-round matching configs
///
/// Round configs change rarely while suggestion requests repeat often, so
/// lookups are served from memory until the TTL expires.
#[derive(Clone)]
pub struct RoundConfigCache {
    configs: moka::future::Cache<String, MatchConfig>,
}

impl RoundConfigCache {
    pub fn new(max_rounds: u64, ttl_secs: u64) -> Self {
        let configs = moka::future::CacheBuilder::new(max_rounds)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { configs }
    }

    pub async fn get(&self, round: &str) -> Option<MatchConfig> {
        let hit = self.configs.get(round).await;
        if hit.is_some() {
            tracing::trace!("Config cache hit: {}", round);
        }
        hit
    }

    pub async fn insert(&self, round: &str, config: MatchConfig) {
        self.configs.insert(round.to_string(), config).await;
    }
}
