//! 키 기반 TTL 캐시 저장소.
//!
//! 업스트림 피드 페이로드를 key→(payload, fetched_at)로 보관하고,
//! [`CacheStore::get_or_fetch`]로 "신선하면 캐시, 아니면 조회 후 저장"을
//! 제공합니다. 스케줄 작업과 온디맨드 읽기가 같은 저장소를 공유합니다.
//!
//! # 설계
//!
//! - 프로세스 전역 싱글턴이 아니라 생성자 주입으로 전달되는 명시적 객체
//! - 모든 "현재 시각"은 주입된 [`Clock`]에서 파생 (TTL 비교 결정적)
//! - 페이로드는 소스 전체 스냅샷이므로 항상 통째로 교체, 병합 없음
//! - 동일 키 동시 갱신은 last-writer-wins

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use nepse_core::Clock;

use crate::error::FetchError;

/// 캐시 항목.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

/// 키 기반 TTL 캐시 저장소.
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// 빈 캐시 저장소 생성.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// TTL 내의 신선한 페이로드 조회.
    ///
    /// `now - fetched_at < ttl`인 항목만 반환합니다 (경계에서는 만료).
    pub async fn get_fresh(&self, key: &str, ttl: Duration) -> Option<Value> {
        let max_age = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let now = self.clock.now_utc();
        let guard = self.entries.read().await;
        guard.get(key).and_then(|entry| {
            if now.signed_duration_since(entry.fetched_at) < max_age {
                Some(entry.payload.clone())
            } else {
                None
            }
        })
    }

    /// TTL과 무관하게 마지막 항목 조회 (stale 제공 opt-in).
    ///
    /// 조회 실패 시 마지막 성공 값을 대신 쓰고 싶은 호출자가 사용합니다.
    pub async fn get_any(&self, key: &str) -> Option<CacheEntry> {
        let guard = self.entries.read().await;
        guard.get(key).cloned()
    }

    /// 페이로드 통째 교체 저장.
    pub async fn upsert(&self, key: &str, payload: Value) {
        let entry = CacheEntry {
            payload,
            fetched_at: self.clock.now_utc(),
        };
        let mut guard = self.entries.write().await;
        guard.insert(key.to_string(), entry);
    }

    /// 저장된 키 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 저장소가 비어있는지 여부.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 저장된 키 목록 (상태 출력용).
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 신선하면 캐시 반환, 아니면 조회 후 저장.
    ///
    /// - 신선한 항목이 있으면 `fetcher`를 호출하지 않고 반환
    /// - 없으면 `fetcher` 실행; 성공 시 upsert 후 반환
    /// - 실패 시 에러를 그대로 전파하고 기존 항목은 보존
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> Result<Value, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, FetchError>>,
    {
        if let Some(payload) = self.get_fresh(key, ttl).await {
            tracing::debug!(key = key, "캐시 적중");
            return Ok(payload);
        }

        let payload = fetcher().await?;
        self.upsert(key, payload.clone()).await;
        tracing::debug!(key = key, "캐시 갱신");
        Ok(payload)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use nepse_core::FixedClock;
    use serde_json::json;

    use super::*;

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn fresh_hit_skips_fetcher() {
        let clock = fixed_clock();
        let cache = CacheStore::new(clock.clone());
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(300);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"value": 1}))
        };
        let first = cache.get_or_fetch("tickers", ttl, fetch).await.unwrap();
        assert_eq!(first, json!({"value": 1}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // TTL 창 안: fetcher 미호출, 동일 값 반환
        clock.advance(chrono::Duration::seconds(299));
        let second = cache
            .get_or_fetch("tickers", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"value": 2}))
            })
            .await
            .unwrap();
        assert_eq!(second, json!({"value": 1}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expires_exactly_at_ttl_boundary() {
        let clock = fixed_clock();
        let cache = CacheStore::new(clock.clone());
        let ttl = Duration::from_secs(300);

        cache.upsert("tickers", json!({"value": 1})).await;

        // t0 + TTL 정확히: 만료 (start inclusive, end exclusive)
        clock.advance(chrono::Duration::seconds(300));
        assert!(cache.get_fresh("tickers", ttl).await.is_none());

        let calls = AtomicUsize::new(0);
        let refreshed = cache
            .get_or_fetch("tickers", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"value": 2}))
            })
            .await
            .unwrap();
        assert_eq!(refreshed, json!({"value": 2}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_stale_entry() {
        let clock = fixed_clock();
        let cache = CacheStore::new(clock.clone());
        let ttl = Duration::from_secs(60);

        cache.upsert("market-status", json!({"market_live": false})).await;
        clock.advance(chrono::Duration::seconds(120));

        let result = cache
            .get_or_fetch("market-status", ttl, || async {
                Err(FetchError::Timeout {
                    url: "https://example.com".to_string(),
                    timeout: Duration::from_secs(10),
                })
            })
            .await;
        assert!(result.is_err());

        // 기존 항목은 그대로 남아 stale 제공에 쓸 수 있음
        let stale = cache.get_any("market-status").await.unwrap();
        assert_eq!(stale.payload, json!({"market_live": false}));
    }

    #[tokio::test]
    async fn upsert_replaces_wholesale() {
        let cache = CacheStore::new(fixed_clock());
        cache.upsert("news", json!({"a": 1, "b": 2})).await;
        cache.upsert("news", json!({"c": 3})).await;

        let entry = cache.get_any("news").await.unwrap();
        assert_eq!(entry.payload, json!({"c": 3})); // 병합 아님
        assert_eq!(cache.len().await, 1);
    }
}
