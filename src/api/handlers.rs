//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::warn;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    BroadcastRequest, BroadcastResponse, DeleteResponse, GetResponse, HealthResponse,
    PrefixResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::multicast::InvalidationSender;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store handle
    pub cache: CacheStore<String>,
    /// Invalidation publisher, present when multicast is configured
    pub sender: Option<Arc<InvalidationSender>>,
    /// TTL in seconds for sets that do not carry one
    pub default_ttl: u64,
}

impl AppState {
    /// Creates a new AppState around an existing store, without broadcasting.
    pub fn new(cache: CacheStore<String>) -> Self {
        Self {
            cache,
            sender: None,
            default_ttl: Config::default().default_ttl,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Must run inside the tokio runtime so the store can start its sweeper.
    /// A multicast group that cannot be used disables broadcasting only.
    pub async fn from_config(config: &Config) -> Self {
        let sender = match config.multicast {
            Some(multicast) => {
                match InvalidationSender::new(multicast.group, multicast.port).await {
                    Ok(sender) => Some(Arc::new(sender)),
                    Err(e) => {
                        warn!("Broadcasting disabled, invalid multicast settings: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        Self {
            cache: CacheStore::new(config),
            sender,
            default_ttl: config.default_ttl,
        }
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair; `ttl` is in seconds and 0 disables expiry.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = Duration::from_secs(req.ttl.unwrap_or(state.default_ttl));
    state.cache.store(req.key.clone(), req.value, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value.as_str())))
}

/// Handler for DELETE /del/:key
///
/// Uncaching is idempotent, so an unknown key still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.uncache(&key);
    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /prefix/:prefix
pub async fn prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Json<PrefixResponse> {
    let removed = state.cache.uncache_like(&prefix);
    Json(PrefixResponse::new(prefix, removed))
}

/// Handler for POST /broadcast
///
/// Sends the prefix to every process listening on the invalidation group,
/// this one included when it listens as well.
pub async fn broadcast_handler(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>> {
    let sender = state
        .sender
        .as_ref()
        .ok_or(CacheError::MulticastNotConfigured)?;
    sender.send(&req.prefix).await?;

    Ok(Json(BroadcastResponse::new(req.prefix, sender.target())))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(
        &stats,
        state.cache.use_age_ms(),
        state.cache.sweeper_running(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_state() -> AppState {
        AppState::new(CacheStore::new(&Config::default()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = create_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: "test_value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");

        state.cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_from_config_disables_broadcast_on_unicast_group() {
        let config = Config::default().with_multicast("10.0.0.1".parse().unwrap(), 4446);

        let state = AppState::from_config(&config).await;
        assert!(state.sender.is_none());

        let result = broadcast_handler(
            State(state.clone()),
            Json(BroadcastRequest {
                prefix: "user:".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::MulticastNotConfigured)));

        state.cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = create_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler_is_idempotent() {
        let state = create_state();
        state
            .cache
            .store("to_delete", "value".to_string(), Duration::ZERO);

        delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        delete_handler(State(state.clone()), Path("to_delete".to_string())).await;

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prefix_handler() {
        let state = create_state();
        state.cache.store("user:1", "a".to_string(), Duration::ZERO);
        state.cache.store("user:2", "b".to_string(), Duration::ZERO);
        state.cache.store("order:5", "c".to_string(), Duration::ZERO);

        let response = prefix_handler(State(state.clone()), Path("user:".to_string())).await;

        assert_eq!(response.removed, 2);
        assert_eq!(state.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_without_multicast() {
        let state = create_state();
        let req = BroadcastRequest {
            prefix: "user:".to_string(),
        };

        let result = broadcast_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::MulticastNotConfigured)));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = create_state();
        state.cache.store("k", "v".to_string(), Duration::ZERO);
        state.cache.get("k");
        state.cache.get("missing");

        let response = stats_handler(State(state)).await;
        assert_eq!(response.puts, 1);
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.total_entries, 1);
        assert!(response.sweeper_running);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = create_state();

        let req = SetRequest {
            key: "".to_string(),
            value: "value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
